//! Spreadsheet and CSV rendering for attendance data.
//!
//! All renderers produce in-memory byte buffers; the handlers attach the
//! download headers.

use chrono::{Local, NaiveDate, NaiveTime};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::core::attendance::{format_duration, worked_minutes};
use crate::core::report::AttendanceReportEntry;
use crate::model::time_record::{AttendanceStatus, TimeRecordWithEmployee};

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin)
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    Ok(())
}

fn time_or_dash(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn percent_label(value: f64, total_days: u32) -> String {
    if total_days > 0 {
        format!("{value:.1}%")
    } else {
        "0%".to_string()
    }
}

/// Full attendance report workbook: summary, per-employee detail,
/// absences-only and statistics sheets.
pub fn attendance_report_workbook(
    entries: &[AttendanceReportEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    // Resumo Geral
    let sheet = workbook.add_worksheet();
    sheet.set_name("Resumo Geral")?;
    write_headers(
        sheet,
        &[
            "Matrícula",
            "Nome",
            "Cargo",
            "Dias Escalados",
            "Total de Dias",
            "Presentes",
            "Faltas",
            "% Presença",
            "% Faltas",
        ],
    )?;
    for (idx, entry) in entries.iter().enumerate() {
        let row = (idx + 1) as u32;
        let schedule = entry
            .employee
            .work_days
            .iter()
            .map(|d| d.label_pt())
            .collect::<Vec<_>>()
            .join(", ");
        sheet.write_string(row, 0, &entry.employee.registration)?;
        sheet.write_string(row, 1, &entry.employee.name)?;
        sheet.write_string(row, 2, &entry.employee.position)?;
        sheet.write_string(row, 3, schedule)?;
        sheet.write_number(row, 4, entry.total_days as f64)?;
        sheet.write_number(row, 5, entry.present as f64)?;
        sheet.write_number(row, 6, entry.absent as f64)?;
        sheet.write_string(row, 7, percent_label(entry.present_percentage, entry.total_days))?;
        sheet.write_string(row, 8, percent_label(entry.absent_percentage, entry.total_days))?;
    }
    sheet.set_column_width(1, 30)?;
    sheet.set_column_width(3, 30)?;

    // Detalhamento: header row per employee, records, blank separator row.
    let sheet = workbook.add_worksheet();
    sheet.set_name("Detalhamento")?;
    write_headers(
        sheet,
        &["Data", "Matrícula", "Entrada", "Saída", "Status", "Observações"],
    )?;
    let mut row: u32 = 1;
    for entry in entries {
        sheet.write_string(row, 0, format!("FUNCIONÁRIO: {}", entry.employee.name))?;
        sheet.write_string(row, 1, &entry.employee.registration)?;
        row += 1;
        for record in &entry.records {
            sheet.write_string(row, 0, record.date.to_string())?;
            sheet.write_string(row, 1, &entry.employee.registration)?;
            sheet.write_string(row, 2, time_or_dash(record.entry_time))?;
            sheet.write_string(row, 3, time_or_dash(record.exit_time))?;
            sheet.write_string(row, 4, record.status.label_pt())?;
            sheet.write_string(row, 5, record.observations.as_deref().unwrap_or(""))?;
            row += 1;
        }
        row += 1; // separator
    }
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(5, 40)?;

    // Faltas
    let sheet = workbook.add_worksheet();
    sheet.set_name("Faltas")?;
    write_headers(
        sheet,
        &["Data", "Matrícula", "Nome", "Cargo", "Status", "Observações"],
    )?;
    let mut row: u32 = 1;
    for entry in entries {
        for record in entry
            .records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Absent)
        {
            sheet.write_string(row, 0, record.date.to_string())?;
            sheet.write_string(row, 1, &entry.employee.registration)?;
            sheet.write_string(row, 2, &entry.employee.name)?;
            sheet.write_string(row, 3, &entry.employee.position)?;
            sheet.write_string(row, 4, record.status.label_pt())?;
            sheet.write_string(row, 5, record.observations.as_deref().unwrap_or(""))?;
            row += 1;
        }
    }
    sheet.set_column_width(2, 30)?;
    sheet.set_column_width(5, 40)?;

    // Estatísticas
    let total_days: u32 = entries.iter().map(|e| e.total_days).sum();
    let total_present: u32 = entries.iter().map(|e| e.present).sum();
    let total_absent: u32 = entries.iter().map(|e| e.absent).sum();
    let overall = |part: u32| {
        if total_days > 0 {
            format!("{:.1}%", part as f64 / total_days as f64 * 100.0)
        } else {
            "0%".to_string()
        }
    };

    let sheet = workbook.add_worksheet();
    sheet.set_name("Estatísticas")?;
    write_headers(sheet, &["Estatística", "Valor"])?;
    let stats: Vec<(&str, String)> = vec![
        ("Total de Funcionários", entries.len().to_string()),
        ("Total de Dias Trabalhados", total_days.to_string()),
        ("Total de Presenças", total_present.to_string()),
        ("Total de Faltas", total_absent.to_string()),
        ("% Geral de Presença", overall(total_present)),
        ("% Geral de Faltas", overall(total_absent)),
        ("", String::new()),
        ("Período do Relatório", format!("{start} a {end}")),
        (
            "Data de Geração",
            Local::now().format("%d/%m/%Y").to_string(),
        ),
    ];
    for (idx, (label, value)) in stats.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, *label)?;
        sheet.write_string(row, 1, value)?;
    }
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 24)?;

    workbook.save_to_buffer()
}

/// Flat single-sheet export: one row per record.
pub fn simple_records_workbook(rows: &[TimeRecordWithEmployee]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Registros de Ponto")?;
    write_headers(
        sheet,
        &[
            "Data",
            "Matrícula",
            "Nome",
            "Cargo",
            "Entrada",
            "Saída",
            "Status",
            "Observações",
        ],
    )?;
    for (idx, record) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, record.date.to_string())?;
        sheet.write_string(row, 1, &record.registration)?;
        sheet.write_string(row, 2, &record.name)?;
        sheet.write_string(row, 3, &record.position)?;
        sheet.write_string(row, 4, time_or_dash(record.entry_time))?;
        sheet.write_string(row, 5, time_or_dash(record.exit_time))?;
        sheet.write_string(row, 6, record.status.label_pt())?;
        sheet.write_string(row, 7, record.observations.as_deref().unwrap_or(""))?;
    }
    sheet.set_column_width(2, 30)?;
    sheet.set_column_width(7, 40)?;

    workbook.save_to_buffer()
}

/// CSV variant with a computed worked-duration column. Records missing
/// either punch render the duration as "Incompleto".
pub fn records_csv(rows: &[TimeRecordWithEmployee]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Data",
        "Funcionário",
        "Matrícula",
        "Cargo",
        "Entrada",
        "Saída",
        "Horas Trabalhadas",
    ])?;

    for record in rows {
        let duration = worked_minutes(record.entry_time, record.exit_time)
            .map(format_duration)
            .unwrap_or_else(|| "Incompleto".to_string());
        writer.write_record([
            record.date.format("%d/%m/%Y").to_string(),
            record.name.clone(),
            record.registration.clone(),
            record.position.clone(),
            record
                .entry_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            record
                .exit_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            duration,
        ])?;
    }

    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::WeekDay;
    use crate::model::employee::Employee;
    use crate::model::time_record::{ShiftType, TimeRecord};
    use sqlx::types::Json;

    fn joined_row(entry: Option<&str>, exit: Option<&str>) -> TimeRecordWithEmployee {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        TimeRecordWithEmployee {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            entry_time: entry.map(t),
            exit_time: exit.map(t),
            status: if entry.is_some() {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
            shift: ShiftType::FullDay,
            observations: None,
            name: "Maria Souza".into(),
            registration: "EMP-007".into(),
            position: "Vigia".into(),
        }
    }

    #[test]
    fn csv_computes_duration_and_marks_incomplete_rows() {
        let rows = vec![
            joined_row(Some("08:00"), Some("17:00")),
            joined_row(Some("08:00"), Some("16:30")),
            joined_row(Some("08:00"), None),
        ];
        let bytes = records_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Data,Funcionário,Matrícula"));
        assert!(lines[1].ends_with("9h"));
        assert!(lines[2].ends_with("8h 30min"));
        assert!(lines[3].ends_with("Incompleto"));
        assert!(lines[1].starts_with("02/06/2025"));
    }

    #[test]
    fn report_workbook_renders_to_buffer() {
        let employee = Employee {
            id: 7,
            name: "Maria Souza".into(),
            position: "Vigia".into(),
            registration: "EMP-007".into(),
            work_days: Json(vec![WeekDay::Monday, WeekDay::Friday]),
            created_at: None,
        };
        let record = TimeRecord {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            entry_time: NaiveTime::from_hms_opt(8, 0, 0),
            exit_time: NaiveTime::from_hms_opt(17, 0, 0),
            status: AttendanceStatus::Present,
            shift: ShiftType::FullDay,
            observations: None,
            created_at: None,
        };
        let entries = vec![AttendanceReportEntry {
            employee,
            total_days: 2,
            present: 1,
            absent: 0,
            present_percentage: 50.0,
            absent_percentage: 0.0,
            records: vec![record],
        }];

        let bytes = attendance_report_workbook(
            &entries,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        )
        .unwrap();
        // xlsx files are zip archives
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn simple_workbook_renders_to_buffer() {
        let bytes = simple_records_workbook(&[joined_row(Some("08:00"), Some("12:00"))]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
