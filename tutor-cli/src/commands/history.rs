use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tutor_core::history::{AssessmentRecord, JsonAssessmentStore};

use crate::ui;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only show this student's sessions
    #[arg(long)]
    pub student: Option<String>,

    /// Print the full assessment of the most recent session
    #[arg(long)]
    pub last: bool,
}

pub async fn run(args: HistoryArgs) -> Result<()> {
    let store = JsonAssessmentStore::open_default();
    let records = match &args.student {
        Some(name) => store.for_student(name).await?,
        None => store.list().await?,
    };

    if records.is_empty() {
        println!("No finished sessions yet.");
        return Ok(());
    }

    if args.last {
        let latest = &records[0];
        ui::print_header(&format!(
            "{}: {} ({})",
            latest.student_name,
            latest.topic_name,
            latest.completed_at.format("%Y-%m-%d")
        ));
        ui::print_assessment(&latest.assessment);
        return Ok(());
    }

    println!("{}", history_table(&records));
    Ok(())
}

fn history_table(records: &[AssessmentRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Student").fg(Color::Cyan),
        Cell::new("Topic").fg(Color::Cyan),
        Cell::new("Grade").fg(Color::Cyan),
        Cell::new("Questions").fg(Color::Cyan),
        Cell::new("Hints").fg(Color::Cyan),
        Cell::new("Avg score").fg(Color::Cyan),
        Cell::new("Final level").fg(Color::Cyan),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.completed_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.student_name),
            Cell::new(&record.topic_name),
            Cell::new(record.grade),
            Cell::new(record.question_count),
            Cell::new(record.hints_used),
            Cell::new(format_average(record.average_score())),
            Cell::new(record.final_difficulty),
        ]);
    }
    table
}

fn format_average(average: Option<f64>) -> String {
    match average {
        Some(avg) => format!("{:.0}", avg),
        None => "-".to_string(),
    }
}
