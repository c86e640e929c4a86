//! Scores stay in range whatever the input looks like.

use std::collections::BTreeMap;

use blogeval_core::{
    AgentEvaluator, AgentMetrics, ContentEvaluator, Grade, TaskMetrics, TaskStatus,
};
use rstest::rstest;

fn in_range(score: f64) -> bool {
    (0.0..=100.0).contains(&score)
}

#[rstest]
#[case("", "", "")]
#[case("<<<>>>", "<p><p><p></div>", ",,,")]
#[case("TODO", "<script>alert('x')</script><style>p{}</style>", "a")]
#[case("A title that goes on and on and on well past any sensible length for a headline", "<h1>x</h1><h1>y</h1>", "a,b,c,d,e,f,g,h,i")]
#[case("Lorem ipsum", "lorem ipsum placeholder todo tbd xxx", "x")]
#[case("Unicode \u{2014} caf\u{e9}", "<p>na\u{ef}ve caf\u{e9} \u{1f600} r\u{e9}sum\u{e9}.</p>", "\u{e9}t\u{e9}")]
fn content_axes_are_bounded(#[case] title: &str, #[case] content: &str, #[case] tags: &str) {
    let score = ContentEvaluator::new().evaluate_content(title, content, tags);
    for axis in [
        score.readability_score(),
        score.structure_score(),
        score.seo_score(),
        score.completeness_score(),
        score.overall_score(),
    ] {
        assert!(in_range(axis), "{} out of range", axis);
    }
    assert_eq!(score.grade(), Grade::from_score(score.overall_score()));
}

#[test]
fn many_sections_do_not_go_negative() {
    let html: String = (0..20)
        .map(|i| format!("<h2>Heading {i}</h2>"))
        .collect::<Vec<_>>()
        .join("\n");
    let score = ContentEvaluator::new().evaluate_content("x", &html, "");
    assert!(in_range(score.structure_score()));
    assert!(score
        .issues()
        .contains(&"Too many main sections - content may be fragmented".to_string()));
}

#[rstest]
#[case(0.0, 0, 0)]
#[case(500.0, 40, 10)]
#[case(5.0, 3, 0)]
fn agent_axes_are_bounded(#[case] duration: f64, #[case] tool_calls: u32, #[case] errors: usize) {
    let mut agent = AgentMetrics::new("agent").with_tool_calls(tool_calls);
    agent.errors = vec!["failure".to_string(); errors];
    let agents = BTreeMap::from([("agent".to_string(), agent)]);
    let tasks: Vec<TaskMetrics> = (0..6)
        .map(|i| {
            TaskMetrics::new(format!("t{i}"), "agent").finished(
                TaskStatus::from(if i % 2 == 0 { "completed" } else { "failed" }),
                duration / 2.0 * i as f64,
                i * 7,
            )
        })
        .collect();

    let score = AgentEvaluator::new().evaluate_agent_performance(&agents, &tasks, duration);
    for axis in [
        score.efficiency_score(),
        score.reliability_score(),
        score.quality_score(),
        score.overall_score(),
    ] {
        assert!(in_range(axis), "{} out of range", axis);
    }
}
