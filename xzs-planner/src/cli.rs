//! Terminal rendering and the interactive workflow loop

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use xzs_common::topic::DiscoveryStatus;
use xzs_common::{TopicCandidate, TopicType};
use xzs_planner::address::{write_address, NavigationHistory, SessionView};
use xzs_planner::browse::BrowsePage;
use xzs_planner::client::{HttpTopicClient, MaterialGenerator, TopicRepository};
use xzs_planner::recipes::RecipeSource;
use xzs_planner::theme::ThemeStore;
use xzs_planner::workflow::steps::draft::{DraftPhase, PrevOutcome, TARGET_CHAR_RANGE};
use xzs_planner::workflow::steps::{ConfirmStep, CookingStep, DraftStep, MaterialsStep, PublishStep};
use xzs_planner::{PlannerError, SessionState, StepId, WorkflowSession};

pub fn print_topic(topic: &TopicCandidate) {
    let mut flags = Vec::new();
    if topic.base.is_favorited {
        flags.push("★");
    }
    if topic.base.is_done {
        flags.push("done");
    }
    let appeal = format!("appeal {}/3", topic.appeal_count());
    flags.push(&appeal);
    println!(
        "  [{}] {} - {} ({}, {}, score {:.1}) {}",
        topic.id(),
        topic.work_name(),
        topic.dish_name(),
        topic.topic_type().label(),
        topic.base.cooking_difficulty.label(),
        topic.base.total_score,
        flags.join(" ")
    );
}

pub fn print_page(page: &BrowsePage) {
    let count = |t: TopicType| page.counts.get(&t).copied().unwrap_or(0);
    println!(
        "movie_food {} | famous_recipe {} | archaeological {} | favorites {}",
        count(TopicType::MovieFood),
        count(TopicType::FamousRecipe),
        count(TopicType::Archaeological),
        page.favorites_count
    );
    println!("{} ({} topics)", page.tab, page.total);
    if page.topics.is_empty() {
        println!("  (none)");
    }
    for topic in &page.topics {
        print_topic(topic);
    }
    if page.has_more {
        println!("  ... {} more", page.total - page.topics.len());
    }
}

pub fn print_status(status: &DiscoveryStatus) {
    let last_run = status
        .last_run_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "Discovery {}; last run {}, {} topics",
        if status.is_running { "running" } else { "idle" },
        last_run,
        status.last_count
    );
}

pub fn print_themes(store: &ThemeStore) {
    for info in store.themes() {
        let marker = if info.id == store.current() { "*" } else { " " };
        println!("{} {} {} ({})", marker, info.emoji, info.name, info.id);
    }
}

/// Step component for the session's current step
enum ActiveStep {
    Confirm(ConfirmStep),
    Materials(MaterialsStep),
    Draft(DraftStep),
    Cooking(CookingStep),
    Publish(PublishStep),
}

impl ActiveStep {
    fn build(session: &WorkflowSession, recipes: &dyn RecipeSource) -> Result<Self, PlannerError> {
        Ok(match session.current_step() {
            StepId::Confirm => ActiveStep::Confirm(session.confirm_step()?),
            StepId::Materials => ActiveStep::Materials(session.materials_step()?),
            StepId::Draft => ActiveStep::Draft(session.draft_step()?),
            StepId::Cooking => ActiveStep::Cooking(session.cooking_step(recipes)?),
            StepId::Publish => ActiveStep::Publish(session.publish_step()?),
        })
    }

    fn id(&self) -> StepId {
        match self {
            ActiveStep::Confirm(_) => StepId::Confirm,
            ActiveStep::Materials(_) => StepId::Materials,
            ActiveStep::Draft(_) => StepId::Draft,
            ActiveStep::Cooking(_) => StepId::Cooking,
            ActiveStep::Publish(_) => StepId::Publish,
        }
    }

    fn render(&self) {
        match self {
            ActiveStep::Confirm(step) => {
                for ing in step.ingredients() {
                    let mark = if ing.have_at_home { "x" } else { " " };
                    println!("  [{}] {}. {} {}", mark, ing.id, ing.name, ing.amount);
                }
                println!("  To buy: {}", step.shopping_list().len());
            }
            ActiveStep::Materials(step) => {
                if step.is_loading() {
                    println!("  Generating...");
                } else if !step.is_generated() {
                    println!("  No material yet; `generate` to request it");
                }
                for m in step.materials() {
                    let mark = if m.selected { "x" } else { " " };
                    println!(
                        "  [{}] {} ({}, {}) {}",
                        mark,
                        m.material.id,
                        m.material.category,
                        m.material.credibility.label(),
                        m.material.content
                    );
                }
            }
            ActiveStep::Draft(step) => render_draft(step),
            ActiveStep::Cooking(step) => {
                println!(
                    "  {} - about {} min, {}/{} done",
                    step.dish_name(),
                    step.total_minutes(),
                    step.completed_count(),
                    step.steps().len()
                );
                for (i, s) in step.steps().iter().enumerate() {
                    let mark = if s.completed { "x" } else { " " };
                    let focus = if i == step.current_index() { ">" } else { " " };
                    println!(
                        "{} [{}] {}. {} ({})",
                        focus,
                        mark,
                        s.step.id,
                        s.step.title,
                        s.step.duration.as_deref().unwrap_or("-")
                    );
                    if s.expanded {
                        for line in &s.step.ingredients {
                            println!("       + {}", line);
                        }
                        for line in &s.step.details {
                            println!("       - {}", line);
                        }
                        for line in &s.step.tips {
                            println!("       tip: {}", line);
                        }
                        for line in &s.step.warnings {
                            println!("       warning: {}", line);
                        }
                    }
                }
                for link in step.video_links() {
                    println!("  {}: {}", link.platform, link.url);
                }
            }
            ActiveStep::Publish(step) => match step.material() {
                None => println!("  No publish material yet; `generate` to create it"),
                Some(m) => {
                    println!("  Covers:");
                    for (i, text) in m.cover_texts.iter().enumerate() {
                        let mark = if i == m.selected_cover { "*" } else { " " };
                        println!("   {} {}. {}", mark, i, text);
                    }
                    println!("  Titles:");
                    for (i, text) in m.title_options.iter().enumerate() {
                        let mark = if i == m.selected_title { "*" } else { " " };
                        println!("   {} {}. {}", mark, i, text);
                    }
                }
            },
        }
    }
}

fn render_draft(step: &DraftStep) {
    match step.phase() {
        DraftPhase::Blocks => {
            if !step.blocks_generated() {
                println!("  `blocks` to build material blocks");
            }
            let selected: Vec<&str> = step.selected_blocks().iter().map(|b| b.id.as_str()).collect();
            for block in step.blocks() {
                let order = selected
                    .iter()
                    .position(|id| *id == block.id)
                    .map(|p| (p + 1).to_string())
                    .unwrap_or_else(|| " ".to_string());
                println!("  [{}] {} <{}> {}", order, block.id, block.role, block.content);
            }
        }
        DraftPhase::Outline => {
            for outline in step.outlines() {
                let chosen = step.selected_outline().map(|o| o.id == outline.id).unwrap_or(false);
                println!(
                    "  {} {}. {}{} - {} ({} words)",
                    if chosen { "*" } else { " " },
                    outline.id,
                    outline.title,
                    if outline.is_recommended { " [recommended]" } else { "" },
                    outline.structure,
                    outline.word_count
                );
                println!("       hook: {}", outline.hook);
                if let Some(reason) = outline.recommend_reason.as_deref().filter(|_| outline.is_recommended) {
                    println!("       why: {}", reason);
                }
            }
        }
        DraftPhase::Draft => {
            println!("  `prompt` prints the prompt; `paste` reads the draft, ending with a line `.`");
            println!("  Draft: {} characters", step.draft().trim().chars().count());
        }
        DraftPhase::Review => {
            println!("{}", step.draft());
            println!(
                "  {} characters (target {}-{}){}",
                step.char_count(),
                TARGET_CHAR_RANGE.start(),
                TARGET_CHAR_RANGE.end(),
                if step.in_target_range() { "" } else { " - outside target" }
            );
        }
    }
}

const HELP: &str = "\
Navigation: next, prev, jump <n>, back, forward, steps, help, quit
Confirm:    toggle <id>, all, none, list
Materials:  generate, toggle <id>
Draft:      blocks, pick <id>, auto, clear, outline, choose <id>, prompt, paste, done
Cooking:    check <id>, expand <id>, focus <n>
Publish:    generate, cover <n>, title <n>, complete";

async fn read_paste(lines: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    let mut text = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "." {
            break;
        }
        text.push(line);
    }
    Ok(text.join("\n"))
}

fn report(result: Result<(), PlannerError>) {
    if let Err(e) = result {
        println!("  {}", e);
    }
}

/// Drive a workflow session from stdin commands
pub async fn run_workflow(
    client: Arc<HttpTopicClient>,
    recipes: &dyn RecipeSource,
    topic_id: &str,
    step: usize,
) -> Result<()> {
    let repo: &dyn TopicRepository = &*client;
    let generator: &dyn MaterialGenerator = &*client;

    let history = NavigationHistory::new(write_address(&SessionView::Workflow {
        topic_id: topic_id.to_string(),
        step,
    }));
    let mut session = WorkflowSession::new(history)?;

    if let Err(e) = session.load(repo).await {
        println!("Could not open topic {}: {}", topic_id, e);
        session.go_back();
        return Ok(());
    }
    if let Some(topic) = session.topic() {
        println!("{} - {}", topic.work_name(), topic.dish_name());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut active = ActiveStep::build(&session, recipes)?;
    let mut shown_index = usize::MAX;

    loop {
        if session.state() == SessionState::Completed {
            println!("Workflow complete. Back at {}", session.current_address());
            return Ok(());
        }
        if !session.is_on_workflow() {
            println!("Left the workflow ({})", session.current_address());
            return Ok(());
        }

        let index = session.current_step_index();
        if index != shown_index || active.id() != session.current_step() {
            active = ActiveStep::build(&session, recipes)?;
            shown_index = index;
            println!("\n== Step {}/5: {} ==", index + 1, session.current_step().title());
            active.render();
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next().unwrap_or("");

        match (command, &mut active) {
            ("quit" | "q", _) => return Ok(()),
            ("help", _) => println!("{}", HELP),
            ("steps", _) => {
                for s in session.steps() {
                    let mark = if s.completed { "x" } else { " " };
                    println!("  [{}] {}. {}", mark, s.id.index(), s.title);
                }
            }
            ("back", _) => {
                session.back();
            }
            ("forward", _) => {
                session.forward();
            }
            ("jump", _) => match arg.parse::<usize>() {
                Ok(n) => {
                    if !session.jump_to(n)? {
                        println!("  Step {} is not reachable yet", n);
                    }
                }
                Err(_) => println!("  jump <step index>"),
            },
            ("prev", ActiveStep::Draft(step)) => match step.prev() {
                PrevOutcome::ExitStep => {
                    session.retreat()?;
                }
                PrevOutcome::Phase(_) => render_draft(step),
            },
            ("prev", _) => {
                session.retreat()?;
            }
            ("next", ActiveStep::Publish(_)) => println!("  Use `complete` to finish"),
            ("next", step) => {
                let output = match step {
                    ActiveStep::Confirm(s) => s.next(),
                    ActiveStep::Materials(s) => s.next(),
                    ActiveStep::Draft(s) => s.next(),
                    ActiveStep::Cooking(s) => s.next(),
                    ActiveStep::Publish(s) => s.next(),
                };
                match output {
                    Ok(output) => report(session.advance(step.id(), Some(output))),
                    Err(e) => println!("  {}", e),
                }
            }

            ("toggle", ActiveStep::Confirm(s)) => {
                s.toggle(arg);
                active.render();
            }
            ("all", ActiveStep::Confirm(s)) => {
                s.mark_all(true);
                active.render();
            }
            ("none", ActiveStep::Confirm(s)) => {
                s.mark_all(false);
                active.render();
            }
            ("list", ActiveStep::Confirm(s)) => println!("{}", s.shopping_list_text()),

            ("generate", ActiveStep::Materials(s)) => {
                report(s.generate(generator).await.map(|_| ()));
                active.render();
            }
            ("toggle", ActiveStep::Materials(s)) => {
                s.toggle(arg);
                active.render();
            }

            ("blocks", ActiveStep::Draft(s)) => {
                s.generate_blocks();
                active.render();
            }
            ("pick", ActiveStep::Draft(s)) => {
                s.toggle_block(arg);
                active.render();
            }
            ("auto", ActiveStep::Draft(s)) => {
                s.auto_sort();
                active.render();
            }
            ("clear", ActiveStep::Draft(s)) => {
                s.clear_selection();
                active.render();
            }
            ("outline", ActiveStep::Draft(s)) => {
                report(s.generate_outlines().map(|_| ()));
                active.render();
            }
            ("choose", ActiveStep::Draft(s)) => {
                if !s.select_outline(arg) {
                    println!("  No outline {}", arg);
                }
                active.render();
            }
            ("prompt", ActiveStep::Draft(s)) => {
                if s.phase() == DraftPhase::Outline {
                    report(s.show_prompt());
                }
                match s.prompt() {
                    Some(prompt) => println!("{}", prompt),
                    None => println!("  Choose an outline first"),
                }
            }
            ("paste", ActiveStep::Draft(s)) => {
                let text = read_paste(&mut lines).await?;
                s.set_draft(text);
                active.render();
            }
            ("done", ActiveStep::Draft(s)) => {
                report(s.finish_draft());
                active.render();
            }

            ("check", ActiveStep::Cooking(s)) => {
                s.toggle_completed(arg);
                active.render();
            }
            ("expand", ActiveStep::Cooking(s)) => {
                s.toggle_expanded(arg);
                active.render();
            }
            ("focus", ActiveStep::Cooking(s)) => {
                if let Ok(n) = arg.parse::<usize>() {
                    s.expand_step(n);
                }
                active.render();
            }

            ("generate", ActiveStep::Publish(s)) => {
                s.generate();
                active.render();
            }
            ("cover", ActiveStep::Publish(s)) => {
                if let Ok(n) = arg.parse::<usize>() {
                    s.select_cover(n);
                }
                active.render();
            }
            ("title", ActiveStep::Publish(s)) => {
                if let Ok(n) = arg.parse::<usize>() {
                    s.select_title(n);
                }
                active.render();
            }
            ("complete", ActiveStep::Publish(s)) => match s.next() {
                Ok(output) => {
                    if let Err(e) = session.complete(repo, Some(output)).await {
                        println!("  Could not complete: {} (try again)", e);
                    }
                }
                Err(e) => println!("  {}", e),
            },

            _ => println!("  Unknown command here; `help` lists commands"),
        }
    }
}
