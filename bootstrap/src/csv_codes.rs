use anyhow::Context;
use application_ports::login_code::{CodeExportRowDto, CodeImportRow};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Deserialize)]
struct ImportRecord {
    full_name: String,
    #[serde(default)]
    login_code: String,
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    full_name: &'a str,
    role: &'a str,
    login_code: &'a str,
    current_class_id: Option<i64>,
}

/// Reads a headered `full_name,login_code` file. Row numbers are the line
/// numbers of the source, so the first record is row 2.
pub fn read_import_rows<R: Read>(source: R) -> anyhow::Result<Vec<CodeImportRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for (n, res) in csv_reader.records().enumerate() {
        let record = res.with_context(|| format!("Malformed CSV record {}", n + 1))?;
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(n + 2);
        let ImportRecord {
            full_name,
            login_code,
        } = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Error on line {}", row_number))?;

        rows.push(CodeImportRow {
            row_number,
            full_name,
            login_code,
        });
    }

    Ok(rows)
}

pub fn write_export_rows<W: Write>(target: W, rows: &[CodeExportRowDto]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(target);

    for row in rows {
        writer.serialize(ExportRecord {
            full_name: &row.full_name,
            role: row.role.as_str(),
            login_code: row.login_code.as_str(),
            current_class_id: row.current_class_id.map(|c| c.0),
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_shared::login_code::LoginCode;
    use domain_shared::school::{ClassId, Role};

    #[test]
    fn import_rows_are_numbered_by_source_line() {
        let source = "full_name,login_code\n Huda Karim , tch12345\nSami Aziz,\n";

        let rows = read_import_rows(source.as_bytes()).unwrap();

        assert_eq!(
            rows,
            vec![
                CodeImportRow {
                    row_number: 2,
                    full_name: "Huda Karim".to_string(),
                    login_code: "tch12345".to_string(),
                },
                CodeImportRow {
                    row_number: 3,
                    full_name: "Sami Aziz".to_string(),
                    login_code: String::new(),
                },
            ]
        );
    }

    #[test]
    fn import_columns_may_come_in_any_order() {
        let source = "login_code,full_name\nSTD00001,Lina Haddad\n";

        let rows = read_import_rows(source.as_bytes()).unwrap();

        assert_eq!(rows[0].full_name, "Lina Haddad");
        assert_eq!(rows[0].login_code, "STD00001");
    }

    #[test]
    fn import_without_name_column_fails() {
        let source = "login_code\nSTD00001\n";

        assert!(read_import_rows(source.as_bytes()).is_err());
    }

    #[test]
    fn export_writes_a_header_and_one_line_per_user() {
        let rows = vec![
            CodeExportRowDto {
                full_name: "Sami Aziz".to_string(),
                role: Role::Teacher,
                login_code: LoginCode("TCH11111".to_string()),
                current_class_id: None,
            },
            CodeExportRowDto {
                full_name: "Amal Yusuf".to_string(),
                role: Role::Student,
                login_code: LoginCode("STD22222".to_string()),
                current_class_id: Some(ClassId(7)),
            },
        ];
        let mut target = Vec::new();

        write_export_rows(&mut target, &rows).unwrap();

        assert_eq!(
            String::from_utf8(target).unwrap(),
            "full_name,role,login_code,current_class_id\n\
             Sami Aziz,teacher,TCH11111,\n\
             Amal Yusuf,student,STD22222,7\n"
        );
    }
}
