use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tutor_core::catalog::{self, DEFAULT_GRADE};

use crate::ui;

#[derive(Debug, Args)]
pub struct TopicsArgs {
    /// Topic to describe (omit to list all)
    pub topic: Option<String>,

    /// Grade whose expectations to show
    #[arg(long, default_value_t = DEFAULT_GRADE)]
    pub grade: u8,
}

pub fn run(args: TopicsArgs) -> Result<()> {
    match args.topic {
        Some(key) => show_topic(&key, args.grade),
        None => {
            list_topics();
            Ok(())
        }
    }
}

fn list_topics() {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Key").fg(Color::Cyan),
        Cell::new("Topic").fg(Color::Cyan),
        Cell::new("Grades").fg(Color::Cyan),
    ]);

    for topic in catalog::all() {
        let grades: Vec<String> = topic.grades().iter().map(u8::to_string).collect();
        table.add_row(vec![
            Cell::new(topic.key),
            Cell::new(topic.display_name),
            Cell::new(grades.join(", ")),
        ]);
    }

    println!("{table}");
}

fn show_topic(key: &str, grade: u8) -> Result<()> {
    let Some(topic) = catalog::find(key) else {
        bail!("Unknown topic '{}'. Run `tutor topics` to list them.", key);
    };

    ui::print_header(&format!("{} (grade {})", topic.display_name, grade));

    println!("Expectations:");
    for item in topic.expectations_for(grade) {
        println!("  • {}", item);
    }
    println!();
    println!("Progression: {}", topic.progression_path.join(" → "));
    Ok(())
}
