//! End-to-end tests of the research engine against scripted providers.

mod common;

use common::mocks::{learning, MockSearch, Script, ScriptedLLM};
use deep_research::research::evaluator::{
    EvaluateTool, EvaluationPhase, EvaluationState, SearchTool,
};
use deep_research::research::{ResultEvaluator, FALLBACK_REPORT};
use deep_research::tools::Tool;
use deep_research::utils::config::EngineConfig;
use deep_research::{AppError, ResearchSession, ResearchStore, SearchOptions, SearchResult};
use parking_lot::Mutex;
use rstest::rstest;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn engine(depth: u32, breadth: usize) -> EngineConfig {
    EngineConfig {
        depth,
        breadth,
        ..EngineConfig::default()
    }
}

fn session(llm: &Arc<ScriptedLLM>, search: &Arc<MockSearch>, config: EngineConfig) -> ResearchSession {
    ResearchSession::new(llm.clone(), search.clone(), SearchOptions::default(), config)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============= Orchestration =============

#[tokio::test]
async fn test_single_follow_up_scenario() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|prompt: &str| {
            if prompt == "P" {
                strings(&["q1", "q2"])
            } else {
                strings(&["r1"])
            }
        }),
        relevant: Box::new(|_: &str| true),
        learn: Box::new(|url: &str| {
            if url == "u1" {
                learning("L1", &["f1"])
            } else {
                learning("other", &[])
            }
        }),
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let outcome = session(&llm, &search, engine(2, 2)).run("P").await.unwrap();
    let snapshot = outcome.snapshot;

    assert_eq!(snapshot.topic.as_deref(), Some("P"));
    assert_eq!(snapshot.queries, strings(&["q1", "q2", "r1"]));
    assert!(snapshot.completed_queries.contains(&"q1".to_string()));
    assert!(snapshot.completed_queries.contains(&"q2".to_string()));

    let urls: Vec<&str> = snapshot.search_results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["u1"]);
    assert_eq!(snapshot.learnings.len(), 1);
    assert_eq!(snapshot.learnings[0].learning, "L1");

    // Exactly one recursive call, with depth 1 and breadth 1
    assert_eq!(snapshot.expansions.len(), 2);
    let recursive = &snapshot.expansions[1];
    assert_eq!((recursive.depth, recursive.breadth), (1, 1));
    for part in ["P", "q1", "L1", "f1"] {
        assert!(recursive.prompt.contains(part), "missing {part}");
    }

    assert_eq!(llm.calls_for("query_plan"), 2);
    assert_eq!(outcome.report, "# Report");
    let text_calls = llm.text_calls();
    assert_eq!(text_calls.len(), 1);
    assert!(text_calls[0].contains("\"u1\""));
}

#[tokio::test]
async fn test_duplicate_url_rejected_without_relevance_call() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|_: &str| strings(&["q1", "q2"])),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]).with("q2", &["u1"]));

    let snapshot = session(&llm, &search, engine(1, 2))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    assert_eq!(search.queries(), strings(&["q1", "q2"]));
    assert_eq!(llm.calls_for("relevance"), 1);
    assert_eq!(snapshot.search_results.len(), 1);
    assert_eq!(snapshot.learnings.len(), 1);
    assert_eq!(snapshot.completed_queries, strings(&["q1", "q2"]));
}

#[tokio::test]
async fn test_rejected_url_judged_once() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|_: &str| strings(&["q1", "q2"])),
        relevant: Box::new(|_: &str| false),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]).with("q2", &["u1"]));

    let snapshot = session(&llm, &search, engine(1, 2))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    assert_eq!(search.queries(), strings(&["q1", "q2"]));
    assert_eq!(llm.calls_for("relevance"), 1);
    assert!(snapshot.search_results.is_empty());
    assert_eq!(snapshot.completed_queries, strings(&["q1", "q2"]));
}

#[tokio::test]
async fn test_wide_breadth_is_capped_at_five_queries() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|_: &str| strings(&["q1", "q2", "q3", "q4", "q5"])),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::new());

    let snapshot = session(&llm, &search, engine(1, 8))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    let plans = llm.prompts_for("query_plan");
    assert_eq!(plans.len(), 1);
    assert!(plans[0].starts_with("Generate 5 distinct"));
    assert_eq!(snapshot.queries.len(), 5);
    assert_eq!(search.queries().len(), 5);
}

#[tokio::test]
async fn test_each_query_processed_at_most_once() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|prompt: &str| {
            if prompt == "P" {
                strings(&["q1", "q2"])
            } else {
                strings(&["q1", "q2", "q3"])
            }
        }),
        relevant: Box::new(|_: &str| true),
        learn: Box::new(|url: &str| {
            if url == "u1" {
                learning("L1", &["f1"])
            } else {
                learning("L2", &[])
            }
        }),
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]).with("q2", &["u2"]));

    let snapshot = session(&llm, &search, engine(2, 2))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    assert_eq!(search.queries(), strings(&["q1", "q2", "q3"]));
    assert_eq!(snapshot.queries, strings(&["q1", "q2", "q3"]));
    assert_eq!(snapshot.completed_queries, snapshot.queries);
    assert_eq!(snapshot.learnings.len(), 2);
    assert_eq!(llm.calls_for("learning"), 2);
}

#[tokio::test]
async fn test_depth_zero_does_no_work() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let outcome = session(&llm, &search, engine(2, 2))
        .run_with("P", 0, 3)
        .await
        .unwrap();

    assert_eq!(outcome.report, FALLBACK_REPORT);
    assert!(outcome.snapshot.topic.is_none());
    assert!(outcome.snapshot.queries.is_empty());
    assert_eq!(outcome.snapshot.calls, 0);
    assert_eq!(llm.calls_for("query_plan"), 0);
    assert_eq!(llm.tool_turns(), 0);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn test_recursion_chain_bounded_by_depth() {
    let counter = Arc::new(AtomicUsize::new(0));
    let plan_counter = counter.clone();
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(move |_: &str| {
            vec![format!("q{}", plan_counter.fetch_add(1, Ordering::SeqCst))]
        }),
        relevant: Box::new(|_: &str| true),
        learn: Box::new(|url: &str| learning(&format!("about {}", url), &["deeper?"])),
    }));
    let mut search = MockSearch::new();
    for i in 0..10 {
        let url = format!("u{}", i);
        search = search.with(&format!("q{}", i), &[url.as_str()]);
    }
    let search = Arc::new(search);

    let snapshot = session(&llm, &search, engine(3, 1))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    let depths: Vec<u32> = snapshot.expansions.iter().map(|e| e.depth).collect();
    assert_eq!(depths, vec![3, 2, 1]);
    assert_eq!(snapshot.learnings.len(), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[rstest]
#[case(1, 1)]
#[case(2, 1)]
#[case(3, 2)]
#[case(5, 3)]
#[tokio::test]
async fn test_breadth_halves_with_floor(#[case] breadth: usize, #[case] expected: usize) {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|prompt: &str| {
            if prompt == "P" {
                strings(&["q1"])
            } else {
                strings(&["r1"])
            }
        }),
        relevant: Box::new(|_: &str| true),
        learn: Box::new(|_: &str| learning("L", &["f"])),
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let snapshot = session(&llm, &search, engine(2, breadth))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    assert_eq!(snapshot.expansions[0].breadth, breadth);
    assert_eq!(snapshot.expansions[1].breadth, expected);
    let plans = llm.prompts_for("query_plan");
    assert!(plans[1].contains(&format!("Generate {} distinct", expected)));
}

// ============= Synthesis =============

#[tokio::test]
async fn test_nothing_found_yields_fallback_without_generation() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let search = Arc::new(MockSearch::new());

    let outcome = session(&llm, &search, engine(2, 2)).run("P").await.unwrap();

    assert_eq!(outcome.report, FALLBACK_REPORT);
    assert!(llm.text_calls().is_empty());
    assert_eq!(outcome.snapshot.completed_queries, strings(&["q1"]));
}

#[tokio::test]
async fn test_report_failure_aborts_run() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()).failing_report());
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let err = session(&llm, &search, engine(1, 1)).run("P").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(_)));
}

// ============= Failures =============

#[tokio::test]
async fn test_planning_failure_aborts_run() {
    let llm = Arc::new(ScriptedLLM::new(|_, _| {
        Err(AppError::LLM("model unavailable".to_string()))
    }));
    let search = Arc::new(MockSearch::new());

    let err = session(&llm, &search, engine(2, 2)).run("P").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(_)));
    assert!(search.queries().is_empty());
    assert!(llm.text_calls().is_empty());
}

#[tokio::test]
async fn test_relevance_failure_aborts_run() {
    let llm = Arc::new(ScriptedLLM::new(|schema, _| match schema {
        "query_plan" => Ok(json!({ "queries": ["q1"] })),
        _ => Err(AppError::LLM("judge offline".to_string())),
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let err = session(&llm, &search, engine(2, 2)).run("P").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(_)));
    assert!(llm.text_calls().is_empty());
}

#[tokio::test]
async fn test_schema_violation_aborts_run() {
    let llm = Arc::new(ScriptedLLM::new(|_, _| Ok(json!({ "queries": [] }))));
    let search = Arc::new(MockSearch::new());

    let err = session(&llm, &search, engine(2, 2)).run("P").await.unwrap_err();
    assert!(matches!(err, AppError::Schema(_)));
}

#[tokio::test]
async fn test_search_failure_degrades_to_no_results() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        plan: Box::new(|_: &str| strings(&["q1", "q2"])),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::failing());

    let outcome = session(&llm, &search, engine(2, 2)).run("P").await.unwrap();

    assert_eq!(search.queries(), strings(&["q1", "q2"]));
    assert_eq!(outcome.report, FALLBACK_REPORT);
    assert_eq!(outcome.snapshot.completed_queries, strings(&["q1", "q2"]));
    assert_eq!(llm.calls_for("relevance"), 0);
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let search = Arc::new(MockSearch::new());

    let err = session(&llm, &search, engine(2, 2)).run("   ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

// ============= Budget =============

fn budget_script() -> Script {
    Script {
        plan: Box::new(|prompt: &str| {
            if prompt == "P" {
                strings(&["q1", "q2"])
            } else {
                strings(&["r1"])
            }
        }),
        relevant: Box::new(|_: &str| true),
        learn: Box::new(|url: &str| {
            if url == "u1" {
                learning("L1", &["f1"])
            } else {
                learning("L2", &[])
            }
        }),
    }
}

#[rstest]
#[case(Some(3), None)]
#[case(None, Some(1))]
#[tokio::test]
async fn test_budget_stops_expansion_normally(
    #[case] max_calls: Option<usize>,
    #[case] max_learnings: Option<usize>,
) {
    let llm = Arc::new(ScriptedLLM::from_script(budget_script()));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]).with("q2", &["u2"]));
    let config = EngineConfig {
        max_calls,
        max_learnings,
        ..engine(2, 2)
    };

    let outcome = session(&llm, &search, config).run("P").await.unwrap();
    let snapshot = outcome.snapshot;

    // The recursive expansion was refused; the current level still finished
    assert_eq!(snapshot.expansions.len(), 1);
    assert_eq!(snapshot.learnings.len(), 2);
    assert!(!snapshot.queries.contains(&"r1".to_string()));
    assert_eq!(outcome.report, "# Report");
}

#[tokio::test]
async fn test_calls_are_metered() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));

    let snapshot = session(&llm, &search, engine(1, 1))
        .run("P")
        .await
        .unwrap()
        .snapshot;

    // plan, 2 dialogue turns, search, relevance, learning, report
    assert_eq!(snapshot.calls, 7);
}

// ============= Evaluator =============

#[tokio::test]
async fn test_evaluate_without_pending_result_asks_for_search() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let state = Arc::new(Mutex::new(EvaluationState::new()));
    let tool = EvaluateTool::new(llm.clone(), ResearchStore::new(), "q1", 500, state.clone());

    let value = tool.execute(json!({ "justification": "looks good" })).await.unwrap();

    assert_eq!(value["status"], "no_pending");
    assert_eq!(state.lock().phase(), EvaluationPhase::AwaitingSearch);
    assert_eq!(llm.calls_for("relevance"), 0);
}

#[tokio::test]
async fn test_evaluator_skips_url_already_in_pool() {
    let llm = Arc::new(ScriptedLLM::from_script(Script::default()));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]));
    let store = ResearchStore::new();
    store.admit_result(SearchResult::new("seen", "u1", "content"));

    let evaluator = ResultEvaluator::new(llm.clone(), search, SearchOptions::default(), 6, 500);
    let admitted = evaluator.evaluate("q1", &store).await.unwrap();

    assert!(admitted.is_empty());
    assert_eq!(llm.calls_for("relevance"), 0);
}

#[tokio::test]
async fn test_evaluator_relevance_prompt_lists_processed_urls() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        relevant: Box::new(|_: &str| false),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u2"]));
    let store = ResearchStore::new();
    store.admit_result(SearchResult::new("seen", "u1", "content"));

    let evaluator = ResultEvaluator::new(llm.clone(), search, SearchOptions::default(), 6, 500);
    let admitted = evaluator.evaluate("q1", &store).await.unwrap();

    assert!(admitted.is_empty());
    let prompts = llm.prompts_for("relevance");
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Query: q1"));
    assert!(prompts[0].contains("URL: u2"));
    assert!(prompts[0].contains("u1"));
    assert!(prompts[0].contains("Justification: matches q1"));
}

#[tokio::test]
async fn test_rejected_url_listed_as_processed() {
    let llm = Arc::new(ScriptedLLM::from_script(Script {
        relevant: Box::new(|_: &str| false),
        ..Script::default()
    }));
    let search = Arc::new(MockSearch::new().with("q1", &["u1"]).with("q2", &["u2"]));
    let store = ResearchStore::new();

    let evaluator = ResultEvaluator::new(llm.clone(), search, SearchOptions::default(), 6, 500);
    assert!(evaluator.evaluate("q1", &store).await.unwrap().is_empty());
    assert!(evaluator.evaluate("q2", &store).await.unwrap().is_empty());

    let prompts = llm.prompts_for("relevance");
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Previously processed URLs:\n(none)"));
    assert!(prompts[1].contains("Previously processed URLs:\nu1\n"));
    assert_eq!(store.processed_urls(), strings(&["u1", "u2"]));
}

#[tokio::test]
async fn test_search_tool_reports_pending_url() {
    let search = Arc::new(MockSearch::new().with("q1", &["u1", "u2"]));
    let state = Arc::new(Mutex::new(EvaluationState::new()));
    let tool = SearchTool::new(search, SearchOptions::default(), "q1", state.clone());

    let value = tool.execute(json!({ "query": "q1" })).await.unwrap();

    assert_eq!(value["count"], 2);
    assert_eq!(value["url"], "u2");
    assert_eq!(state.lock().pending_url().as_deref(), Some("u2"));
}
