use crate::infra::{seeded_board, SeededBoard};
use clap::Args;
use hiring_review::error::AppError;
use hiring_review::workflows::review::{
    ApplicationId, BatchAction, FilterSpec, JobId, MessageDraft, SortOrder, Stage, DEFAULT_TAGS,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Job posting id used for the seeded board
    #[arg(long, default_value = "job-demo")]
    pub(crate) job: String,
    /// Skip the candidate notification step
    #[arg(long)]
    pub(crate) skip_notify: bool,
    /// Print every visible record after each step
    #[arg(long)]
    pub(crate) list_records: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        job,
        skip_notify,
        list_records,
    } = args;

    let default_tags: Vec<String> = DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect();
    let (mut board, source, messenger) = seeded_board(JobId(job), &default_tags);

    println!("Application review demo");
    let loaded = board.load().await?;
    println!("- Loaded {loaded} applications for {}", board.job_id());
    render_board(&mut board, list_records);

    println!("\nMove the newest pending application to Selected");
    let newest_pending = board
        .visible_records(SortOrder::Newest)
        .into_iter()
        .find(|record| record.stage() == Stage::Pending)
        .map(|record| record.id.clone());
    if let Some(id) = newest_pending {
        match board.transition(&id, Stage::Selected, Some(0)).await {
            Ok(receipt) => println!(
                "- {} moved {} -> {}",
                receipt.application_id, receipt.from, receipt.to
            ),
            Err(err) => println!("- Move rejected: {err}"),
        }
    }
    render_board(&mut board, list_records);

    println!("\nFilter to Selected candidates");
    board
        .apply_filter(FilterSpec::with_statuses([Stage::Selected]))
        .await?;
    println!("- {} active filter(s)", board.active_filter_count());
    render_board(&mut board, list_records);

    board.select_all();
    println!(
        "\nSelected {} application(s); tagging for onsite loop",
        board.selected_ids().len()
    );
    let report = board
        .execute_batch(BatchAction::Tag {
            tags: vec!["Onsite Loop".to_string()],
        })
        .await?;
    println!(
        "- Tagged {} application(s); catalog now has {} labels",
        report.attempted,
        board.known_tags().len()
    );

    if !skip_notify {
        let reviewer = board.summary().reviewer.display_name;
        board.select_all();
        board
            .execute_batch(BatchAction::Notify {
                draft: MessageDraft {
                    subject: "Onsite interview invitation".to_string(),
                    body: "We'd like to invite you to an onsite interview loop.".to_string(),
                    signed_by: Some(reviewer),
                },
            })
            .await?;
        for (recipients, draft) in messenger.sent() {
            println!(
                "- Sent \"{}\" to {} candidate(s)",
                draft.subject,
                recipients.len()
            );
        }
    }

    println!("\nAnnotate and hire the first selected candidate");
    if let Some(first) = board.visible_ids().first().cloned() {
        board.annotate(&first, "Strong onsite, extend offer").await?;
        board.toggle(&first);
        board
            .execute_batch(BatchAction::Move { stage: Stage::Hired })
            .await?;
        describe(&board, &first);
    }
    render_board(&mut board, list_records);

    println!("\nClear filters");
    board.clear_filters().await?;
    render_board(&mut board, list_records);

    let backend_hired = source
        .snapshot()
        .iter()
        .filter(|record| record.stage() == Stage::Hired)
        .count();
    println!("\nBackend reports {backend_hired} hired application(s)");

    Ok(())
}

fn render_board(board: &mut SeededBoard, list_records: bool) {
    let summary = board.summary();
    println!(
        "  Board {} | {} total | {} visible | {} selected",
        summary.job_id, summary.total, summary.visible, summary.selected
    );
    for column in board.columns() {
        println!("  - {:<9} {}", column.stage.label(), column.count);
    }
    if list_records {
        for record in board.visible_records(SortOrder::CandidateName) {
            println!(
                "    * {} | {} | {} | tags: {}",
                record.id,
                record.candidate.name,
                record.stage(),
                record.tags.join(", ")
            );
        }
    }
    for notice in board.drain_notices() {
        println!("  ! {:?}: {}", notice.level, notice.message);
    }
}

fn describe(board: &SeededBoard, id: &ApplicationId) {
    if let Some(record) = board.get(id) {
        println!(
            "- {} ({}) is now {} | remark: {}",
            record.candidate.name,
            record.id,
            record.stage(),
            record.remark.as_deref().unwrap_or("none")
        );
    }
}
