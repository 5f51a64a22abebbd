use chrono::{Local, NaiveDate};
use clap::Subcommand;
use timeblock_core::{Database, LinkedActivityHook};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// List activities completed on a day
    List {
        /// Day to list (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark a recurring activity complete
    Done {
        /// Activity id
        id: String,
        /// Day to mark (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: ActivityAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Local::now().date_naive();

    match action {
        ActivityAction::List { date } => {
            let done = db.activity_completions_on(date.unwrap_or(today))?;
            println!("{}", serde_json::to_string_pretty(&done)?);
        }
        ActivityAction::Done { id, date } => {
            let date = date.unwrap_or(today);
            db.mark_complete(&id, date)?;
            println!("{id} done for {date}");
        }
    }
    Ok(())
}
