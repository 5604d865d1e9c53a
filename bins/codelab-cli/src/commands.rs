// CLI commands driving a single workspace against the execution backend
use anyhow::{bail, Context, Result};
use codelab_common::config::ClientConfig;
use codelab_common::types::{Language, ProblemSchema};
use codelab_workspace::codec;
use codelab_workspace::{
    AttemptAnswerStore, ContestSummary, HttpExecutionService, InMemoryRepository, ProblemRef,
    ProblemStatus, Workspace,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Env config with command-line overrides on top
pub fn client_config(api_url: Option<&str>, timeout_ms: Option<u64>) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    if let Some(ms) = timeout_ms.filter(|ms| *ms > 0) {
        config.request_timeout_ms = ms;
    }
    config
}

fn load_problem(path: &Path) -> Result<ProblemSchema> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read problem file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse problem file {}", path.display()))
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read source file {}", path.display()))
}

fn parse_language(name: &str) -> Result<Language> {
    match Language::from_str(name) {
        Some(language) => Ok(language),
        None => {
            let known: Vec<String> = Language::all_variants().iter().map(|l| l.to_string()).collect();
            bail!("Unknown language '{}'. Expected one of: {}", name, known.join(", "))
        }
    }
}

/// Mount a workspace on `problem`, inside a local contest attempt when `contest_id` is set
async fn open_workspace(
    config: &ClientConfig,
    problem: ProblemSchema,
    contest_id: Option<&str>,
) -> Result<Workspace> {
    let problem_id = problem.id.clone();
    let repo = InMemoryRepository::new();
    repo.insert_problem(problem);

    let service = Arc::new(HttpExecutionService::new(config.clone())?);
    let problems = Arc::new(repo.clone());

    let mut workspace = match contest_id {
        Some(contest_id) => {
            repo.insert_contest(ContestSummary {
                id: contest_id.to_string(),
                problems: vec![ProblemRef {
                    id: problem_id.clone(),
                    status: ProblemStatus::Unattempted,
                }],
                is_registered: true,
            });
            Workspace::contest(&repo, contest_id, service, problems, AttemptAnswerStore::new()).await?
        }
        None => Workspace::practice(service, problems, vec![problem_id.clone()]),
    };

    workspace = workspace
        .with_timeout(config.request_timeout())
        .with_status_source(Arc::new(repo.clone()));
    workspace.open(&problem_id).await?;

    debug!(problem_id = %problem_id, api = %config.api_base_url, "Workspace mounted");
    Ok(workspace)
}

/// Parse `"<inputs> => <output>"` into a new user case
fn add_extra_case(workspace: &mut Workspace, raw: &str) -> Result<()> {
    let (inputs, output) = raw
        .rsplit_once("=>")
        .with_context(|| format!("Case '{}' must look like \"<inputs> => <output>\"", raw))?;

    let field_count = workspace.cases().field_count();
    let values = codec::decode(inputs, field_count);

    let index = workspace.add_case();
    for (field, value) in values.into_iter().enumerate() {
        workspace.update_case_field(index, field, value);
    }
    workspace.update_case_field(index, field_count, output.trim());
    Ok(())
}

fn print_results(workspace: &Workspace) {
    for view in workspace.result_views() {
        let mark = if view.passed { "PASS" } else { "FAIL" };
        println!(
            "Case {} [{}] {} ({:.3}s, {:.0}KB)",
            view.test_case_number, mark, view.status, view.execution_time, view.memory
        );

        if view.is_hidden {
            println!("  (hidden test case)");
            continue;
        }
        if let Some(input) = view.input.filter(|s| !s.is_empty()) {
            println!("  input:    {}", input);
        }
        if let Some(expected) = view.expected.filter(|s| !s.is_empty()) {
            println!("  expected: {}", expected);
        }
        if let Some(output) = view.output.filter(|s| !s.is_empty()) {
            println!("  output:   {}", output);
        }
        if let Some(error) = view.error {
            println!("  error:    {}", error);
        }
    }
}

pub async fn run(
    config: &ClientConfig,
    problem_path: &Path,
    source_path: &Path,
    language: &str,
    extra_cases: &[String],
) -> Result<()> {
    let problem = load_problem(problem_path)?;
    let code = read_source(source_path)?;
    let language = parse_language(language)?;

    let mut workspace = open_workspace(config, problem, None).await?;
    workspace.set_language(language);
    workspace.set_code(code);
    for raw in extra_cases {
        add_extra_case(&mut workspace, raw)?;
    }

    info!(cases = workspace.cases().len(), "Running code");
    workspace.run().await.context("Run rejected")?;

    print_results(&workspace);
    if let Some(summary) = workspace.run_summary() {
        println!();
        println!("{}", summary.display());
    }
    Ok(())
}

pub async fn submit(
    config: &ClientConfig,
    problem_path: &Path,
    source_path: &Path,
    language: &str,
    contest_id: Option<&str>,
) -> Result<()> {
    let problem = load_problem(problem_path)?;
    let code = read_source(source_path)?;
    let language = parse_language(language)?;

    let mut workspace = open_workspace(config, problem, contest_id).await?;
    workspace.set_language(language);
    workspace.set_code(code);

    workspace.submit().await.context("Submission rejected")?;

    print_results(&workspace);
    if let Some(summary) = workspace.submit_summary() {
        println!();
        println!("Verdict: {}", summary.raw_status);
        println!("{} ({}%)", summary.display(), summary.score_percent());
    }
    if let Some(status) = workspace.problem_status() {
        debug!(status = ?status, "Problem status after submission");
    }
    Ok(())
}

pub async fn answer_mcq(
    config: &ClientConfig,
    problem_path: &Path,
    option: usize,
    contest_id: Option<&str>,
) -> Result<()> {
    let problem = load_problem(problem_path)?;
    let mut workspace = open_workspace(config, problem, contest_id).await?;

    workspace.select_option(option).context("Invalid selection")?;
    match workspace.submit_mcq().await.context("Answer rejected")? {
        Some(outcome) if outcome.is_correct => {
            println!("Correct: {}", outcome.selected_option);
        }
        Some(outcome) => {
            println!("Incorrect: {}", outcome.selected_option);
        }
        None => {
            let reason = workspace
                .take_notice()
                .map(|n| n.message)
                .unwrap_or_else(|| "Failed to submit answer".to_string());
            bail!(reason);
        }
    }
    Ok(())
}
