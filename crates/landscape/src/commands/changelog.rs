//! `landscape changelog`: the log after replay, optionally with undos.

use tabled::Tabled;
use tracing::warn;

use landscape_core::ChangeLogEntry;

use super::util;
use crate::cli::{ChangelogArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub async fn handle(args: ChangelogArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_session(&args.session, global, None).await?;
    let undo = args.undo;

    let entries: Vec<ChangeLogEntry> = loaded
        .session
        .with_workspace(|ws| {
            let store = ws.store_mut();
            for _ in 0..undo {
                match store.undo_last() {
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "undo failed");
                        break;
                    }
                }
            }
            store.changelog().entries().to_vec()
        })
        .await;

    let mut index = 0;
    let rendered = output::render_list(
        global.output,
        &entries,
        |entry| {
            index += 1;
            EntryRow {
                index,
                action: entry.action().to_string(),
                entity_type: entry.entity_type.to_string(),
                description: entry.to_string(),
            }
        },
        ToString::to_string,
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
