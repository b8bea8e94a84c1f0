use crate::error::RustyTrendsError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

// XML tag names of the SpreadsheetML parts
const TAG_SHARED_STRING_ITEM: QName = QName(b"si"); // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");     // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                // Text content within strings
const TAG_SHEET: QName = QName(b"sheet");           // Worksheet definition
const TAG_ROW: QName = QName(b"row");               // Row in worksheet
const TAG_CELL: QName = QName(b"c");                // Cell in worksheet
const TAG_FORMULA: QName = QName(b"f");             // Cell formula
const TAG_INLINE_STRING: QName = QName(b"is");      // Inline string value
const TAG_VALUE: QName = QName(b"v");               // Cell value content

/// Read-only view of an `.xlsx` package.
///
/// Streams worksheet XML straight out of the archive without building the
/// full document model, so reports never open the workbook for writing.
pub struct XlsxSnapshot<RS: Read + Seek> {
    /// Display name of the package, used in error messages
    name: String,
    zip: ZipArchive<RS>,
    shared_strings: Vec<String>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxSnapshot<BufReader<File>> {
    /// Opens an `.xlsx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RustyTrendsError> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        XlsxSnapshot::from_reader(&path.display().to_string(), file)
    }
}

impl<RS: Read + Seek> XlsxSnapshot<RS> {
    /// Reads the workbook structure and shared strings from any seekable source.
    pub fn from_reader(name: &str, reader: RS) -> Result<Self, RustyTrendsError> {
        let mut zip = ZipArchive::new(reader)?;
        let sheets = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptySpreadsheet(name.to_owned()))?;
        }
        let shared_strings = load_shared_strings(&mut zip)?;
        debug!(name, sheets = sheets.len(), shared_strings = shared_strings.len(), "Opened xlsx snapshot");
        Ok(XlsxSnapshot {
            name: name.to_owned(),
            zip,
            shared_strings,
            sheets,
        })
    }

    /// Worksheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Loads every populated cell of the named worksheet.
    ///
    /// Formula cells keep their formula text; the cached result is ignored.
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, RustyTrendsError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_name.to_owned()))?;
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;

        let mut sheet = Sheet::new(sheet_name);
        let mut row = 0u32;
        let mut col = 0u32;
        let mut kind = None::<String>;
        let mut formula = None::<String>;
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                row = event.parse_attribute_value::<u32>("r")?.unwrap_or(row + 1);
                col = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row, col + 1));
                kind = event.get_attribute_value("t")?.map(|t| t.to_string());
                formula = None;
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_FORMULA => {
                formula = Some(read_string_value(&mut reader, TAG_FORMULA, true)?);
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                let cell = to_cell_value(kind.as_deref(), &value, formula.take(), &self.shared_strings)
                    .map_err(|message| SpreadsheetError::InvalidCellValue {
                        position: format!("{}!{}", self.name, index_to_reference(row, col)),
                        message,
                    })?;
                sheet.set(row, col, cell);
            }
        });
        Ok(sheet)
    }
}

/// Builds the value of one `<c>` element from its type attribute, value text and formula.
fn to_cell_value(
    kind: Option<&str>,
    value: &str,
    formula: Option<String>,
    shared_strings: &[String],
) -> Result<CellValue, String> {
    if let Some(formula) = formula {
        return Ok(CellValue::Formula(format!("={formula}")));
    }
    if value.is_empty() {
        return Ok(CellValue::Empty);
    }
    let cell = match kind {
        Some("s") => {
            let index = value
                .parse::<usize>()
                .map_err(|_| format!("bad shared string index '{value}'"))?;
            let text = shared_strings
                .get(index)
                .ok_or_else(|| format!("shared string {index} out of range"))?;
            CellValue::Text(text.to_owned())
        }
        Some("inlineStr") | Some("str") => CellValue::Text(value.to_owned()),
        Some("b") => CellValue::Bool(value == "1" || value.eq_ignore_ascii_case("true")),
        Some("e") => CellValue::Error(value.to_owned()),
        _ => value
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .map_err(|_| format!("'{value}' is not a number"))?,
    };
    Ok(cell)
}

/// Loads worksheet names and their XML paths from `xl/workbook.xml`.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<(String, String)>, RustyTrendsError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Loads the shared string table; a package without one has no shared strings.
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, RustyTrendsError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Reads the string content of an element up to `end_tag`, skipping phonetic runs.
///
/// With `is_text_content` every text node counts; otherwise only text inside `<t>` does.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, RustyTrendsError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::SheetReader;
    use std::io::Cursor;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(sheet_xml: &str) -> Cursor<Vec<u8>> {
        let parts = [
            ("xl/workbook.xml", r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Traffic-Status" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
            ("xl/sharedStrings.xml", r#"<sst><si><t>Organic</t></si><si><r><t>Mo</t></r><r><t>nth</t></r></si></sst>"#),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ];
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn reads_cell_kinds() -> Result<(), RustyTrendsError> {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
            <row r="3"><c r="B3" t="inlineStr"><is><t>Jan</t></is></c><c r="D3"><v>5288</v></c><c><v>3892</v></c></row>
            <row r="4"><c r="E4"><f>SUM(E3:E3)</f><v>3892</v></c><c r="F4" t="e"><v>#DIV/0!</v></c><c r="G4" t="b"><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let mut snapshot = XlsxSnapshot::from_reader("traffic.xlsx", package(xml))?;
        assert_eq!(snapshot.sheet_names(), vec!["Traffic-Status".to_owned()]);

        let sheet = snapshot.read_sheet("Traffic-Status")?;
        assert_eq!(sheet.value(1, 1), CellValue::Text("Organic".to_owned()));
        assert_eq!(sheet.value(1, 2), CellValue::Text("Month".to_owned()));
        assert_eq!(sheet.value(3, 2), CellValue::Text("Jan".to_owned()));
        assert_eq!(sheet.value(3, 4), CellValue::Number(5288.0));
        assert_eq!(sheet.value(3, 5), CellValue::Number(3892.0));
        assert_eq!(sheet.value(4, 5), CellValue::Formula("=SUM(E3:E3)".to_owned()));
        assert_eq!(sheet.value(4, 6), CellValue::Error("#DIV/0!".to_owned()));
        assert_eq!(sheet.value(4, 7), CellValue::Bool(true));
        assert_eq!(sheet.last_row(), 4);
        Ok(())
    }

    #[test]
    fn missing_sheet_and_bad_values() -> Result<(), RustyTrendsError> {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="C2" t="s"><v>9</v></c></row></sheetData></worksheet>"#;
        let mut snapshot = XlsxSnapshot::from_reader("traffic.xlsx", package(xml))?;

        let missing = snapshot.read_sheet("Paid").err().unwrap();
        assert_eq!(missing.to_string(), "Sheet 'Paid' not found");

        let invalid = snapshot.read_sheet("Traffic-Status").err().unwrap();
        assert_eq!(
            invalid.to_string(),
            "Invalid value at traffic.xlsx!C2: shared string 9 out of range"
        );
        Ok(())
    }

    #[test]
    fn reads_umya_output() -> Result<(), RustyTrendsError> {
        let directory = TempDir::new()?;
        let path = directory.path().join("traffic.xlsx");
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_mut(&0).unwrap().set_name("Traffic-Status");
        let sheet = book.get_sheet_by_name_mut("Traffic-Status").unwrap();
        sheet.get_cell_mut("A1").set_value_string("Organic");
        sheet.get_cell_mut("B2").set_value_string("Jan");
        sheet.get_cell_mut("E2").set_value_number(3892);
        sheet.get_cell_mut("F2").set_value_number(-0.264);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let sheet = XlsxSnapshot::open(&path)?.read_sheet("Traffic-Status")?;
        assert_eq!(sheet.label(1, 1).as_deref(), Some("Organic"));
        assert_eq!(sheet.label(2, 2).as_deref(), Some("Jan"));
        assert_eq!(sheet.value(2, 5).to_number(), Some(3892.0));
        assert_eq!(sheet.value(2, 6).to_number(), Some(-0.264));
        Ok(())
    }
}
