//! `landscape replay`: report what the dispatcher did with each envelope.

use landscape_core::DispatchOutcome;

use super::util::{self, Replayed};
use crate::cli::{GlobalOpts, OutputFormat, ReplayArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(args: ReplayArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_session(&args.session, global, args.skip_user.as_deref()).await?;
    let replayed = loaded.replayed;
    let painter = Painter::new(global.color);

    let rendered = output::render_list(
        global.output,
        &replayed,
        Replayed::clone,
        |r| format!("{}\t{}\t{}\t{}", r.line, r.user, r.event, r.outcome),
    )?;
    output::print_output(&rendered, global.quiet);

    let rejected = replayed.iter().filter(|r| r.is_rejected()).count();
    if !global.quiet && global.output == OutputFormat::Table {
        let summary = format!(
            "{} applied, {} unchanged, {} rejected",
            count(&replayed, DispatchOutcome::Applied),
            count(&replayed, DispatchOutcome::Unchanged),
            rejected
        );
        let summary = if rejected == 0 {
            painter.good(&summary)
        } else {
            painter.bad(&summary)
        };
        eprintln!("{summary}");
    }

    if args.strict && rejected > 0 {
        return Err(CliError::Rejected { count: rejected });
    }
    Ok(())
}

fn count(replayed: &[Replayed], outcome: DispatchOutcome) -> usize {
    let name: &'static str = outcome.into();
    replayed.iter().filter(|r| r.outcome == name).count()
}
