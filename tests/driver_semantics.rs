use palisade::{
    Action, CompileError, Driver, Location, Operator, OperatorKind, Rule, RuleKind, Variable,
    VariableKind, PHASE_COUNT,
};

fn detection(actions: Vec<Action>) -> Rule {
    Rule::new(
        RuleKind::Detection {
            variables: vec![Variable::new(VariableKind::Args)],
            operator: Operator {
                negated: false,
                kind: OperatorKind::Rx,
                argument: "attack".into(),
            },
        },
        actions,
        "semantics.conf",
        7,
    )
}

fn action(actions: Vec<Action>) -> Rule {
    Rule::new(RuleKind::Unconditional, actions, "semantics.conf", 7)
}

#[test]
fn distinct_ids_file_under_their_phases() {
    let mut driver = Driver::new();
    for (id, phase) in [(1, 0), (2, 0), (3, 2), (4, 4)] {
        driver
            .add_sec_rule(detection(vec![Action::Id(id), Action::Phase(phase)]))
            .unwrap();
    }
    assert_eq!(driver.rules().len(), 4);
    assert_eq!(driver.rules().phase(0).map(|p| p.len()), Some(2));
    assert_eq!(driver.rules().phase(2).map(|p| p.len()), Some(1));
    assert_eq!(driver.rules().phase(4).map(|p| p.len()), Some(1));
    assert!(driver.diagnostics().is_empty());
}

#[test]
fn duplicate_id_is_refused_across_phases() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(100), Action::Phase(0)]))
        .unwrap();
    let err = driver
        .add_sec_rule(detection(vec![Action::Id(100), Action::Phase(3)]))
        .unwrap_err();
    assert_eq!(err, CompileError::DuplicateId { id: 100 });
    assert_eq!(driver.diagnostics(), "Rule id: 100 is duplicated\n");
    // The first rule stays; the rejected one is discarded.
    assert_eq!(driver.rules().len(), 1);
}

#[test]
fn id_zero_is_refused_for_plain_rules() {
    let mut driver = Driver::new();
    let err = driver
        .add_sec_rule(detection(vec![Action::Phase(0)]))
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingId {
            file: "semantics.conf".into(),
            line: 7,
        }
    );
    assert_eq!(
        driver.diagnostics(),
        "Rules must have an ID. File: semantics.conf at line: 7\n"
    );
}

#[test]
fn out_of_range_phase_is_refused_everywhere() {
    let mut driver = Driver::new();

    let err = driver
        .add_sec_rule(detection(vec![Action::Id(1), Action::Phase(PHASE_COUNT)]))
        .unwrap_err();
    assert_eq!(err, CompileError::UnknownPhase { phase: PHASE_COUNT });

    let err = driver
        .add_sec_action(action(vec![Action::Phase(9)]))
        .unwrap_err();
    assert_eq!(err, CompileError::UnknownPhase { phase: 9 });

    let script = Rule::new(
        RuleKind::Script {
            path: "/opt/waf/score.lua".into(),
        },
        vec![Action::Phase(6)],
        "semantics.conf",
        7,
    );
    let err = driver.add_sec_rule_script(script).unwrap_err();
    assert_eq!(err, CompileError::UnknownPhase { phase: 6 });

    assert!(driver.rules().is_empty());
}

#[test]
fn continuations_inherit_the_starter_phase() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(10), Action::Phase(2), Action::Chain]))
        .unwrap();
    // The continuation asks for phase 4 and gets phase 2 anyway.
    driver
        .add_sec_rule(detection(vec![Action::Phase(4)]))
        .unwrap();

    let starter = &driver.rules().phase(2).unwrap()[0];
    assert_eq!(starter.chain.len(), 1);
    assert_eq!(starter.chain[0].phase, 2);
}

#[test]
fn continuations_skip_every_id_check() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(50), Action::Phase(0), Action::Chain]))
        .unwrap();
    // No id at all: fine for a continuation.
    driver
        .add_sec_rule(detection(vec![Action::Chain]))
        .unwrap();
    // Even an id the policy already uses is accepted on a continuation.
    driver
        .add_sec_rule(detection(vec![Action::Id(50)]))
        .unwrap();

    let starter = &driver.rules().phase(0).unwrap()[0];
    assert_eq!(starter.chain.len(), 2);
    assert_eq!(starter.chain[1].id, 50);
}

#[test]
fn chained_ids_stay_invisible_to_the_duplicate_scan() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(60), Action::Phase(0), Action::Chain]))
        .unwrap();
    driver
        .add_sec_rule(detection(vec![Action::Id(99)]))
        .unwrap();

    // Id 99 only exists inside a chain, so the scan does not see it.
    driver
        .add_sec_rule(detection(vec![Action::Id(99), Action::Phase(1)]))
        .unwrap();
    assert_eq!(driver.rules().len(), 2);
}

#[test]
fn disruptive_continuations_are_refused() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(70), Action::Phase(1), Action::Chain]))
        .unwrap();
    let err = driver
        .add_sec_rule(detection(vec![Action::Deny]))
        .unwrap_err();
    assert_eq!(err, CompileError::ChainDisruptive);

    // The refusal does not close the chain; a clean continuation still
    // attaches afterwards.
    driver
        .add_sec_rule(detection(vec![Action::Log]))
        .unwrap();
    let starter = &driver.rules().phase(1).unwrap()[0];
    assert_eq!(starter.chain.len(), 1);
    assert!(!starter.chain[0].has_disruptive_action);
}

#[test]
fn starters_may_be_disruptive() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(80), Action::Phase(1), Action::Deny, Action::Chain]))
        .unwrap();
    driver.add_sec_rule(detection(vec![Action::Log])).unwrap();
    assert!(driver.rules().phase(1).unwrap()[0].has_disruptive_action);
}

#[test]
fn unconditional_rules_leave_chains_open() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(90), Action::Phase(1), Action::Chain]))
        .unwrap();
    driver
        .add_sec_action(action(vec![Action::Phase(1), Action::Pass]))
        .unwrap();
    driver.add_sec_rule(detection(vec![Action::Log])).unwrap();

    // The continuation attached to the starter, not to the SecAction that
    // came between them.
    let phase = driver.rules().phase(1).unwrap();
    assert_eq!(phase.len(), 2);
    assert_eq!(phase[0].chain.len(), 1);
    assert!(phase[1].chain.is_empty());
}

#[test]
fn markers_leave_chains_open() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(95), Action::Phase(1), Action::Chain]))
        .unwrap();
    driver.add_sec_marker("MID_CHAIN");
    driver.add_sec_rule(detection(vec![Action::Log])).unwrap();

    let phase = driver.rules().phase(1).unwrap();
    assert_eq!(phase[0].id, 95);
    assert_eq!(phase[0].chain.len(), 1);
    assert_eq!(phase[1].marker_name(), Some("MID_CHAIN"));
}

#[test]
fn marker_names_reach_every_phase() {
    let mut driver = Driver::new();
    driver.add_sec_marker("BEGIN_CHECKS");
    driver.add_sec_marker("END_CHECKS");

    assert_eq!(driver.rules().len(), 2 * PHASE_COUNT);
    for phase in driver.rules().phases() {
        let names: Vec<_> = phase.iter().filter_map(Rule::marker_name).collect();
        assert_eq!(names, vec!["BEGIN_CHECKS", "END_CHECKS"]);
    }
}

#[test]
fn actions_are_exempt_from_id_validation() {
    let mut driver = Driver::new();
    driver
        .add_sec_action(action(vec![Action::Phase(0), Action::Pass]))
        .unwrap();
    driver
        .add_sec_action(action(vec![Action::Id(1), Action::Phase(0)]))
        .unwrap();
    // A second id-1 action is not a duplicate either.
    driver
        .add_sec_action(action(vec![Action::Id(1), Action::Phase(2)]))
        .unwrap();
    assert_eq!(driver.rules().len(), 3);
    assert!(driver.diagnostics().is_empty());
}

#[test]
fn rejected_rules_leave_prior_state_intact() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(1), Action::Phase(0)]))
        .unwrap();
    driver
        .add_sec_rule(detection(vec![Action::Id(2), Action::Phase(1)]))
        .unwrap();
    let _ = driver.add_sec_rule(detection(vec![Action::Id(2), Action::Phase(1)]));

    assert_eq!(driver.rules().len(), 2);
    assert_eq!(driver.rules().phase(0).unwrap()[0].id, 1);
    assert_eq!(driver.rules().phase(1).unwrap()[0].id, 2);
}

#[test]
fn first_located_error_gets_the_header() {
    let mut driver = Driver::new();
    assert!(driver.parse("SecAction \"id:1,phase:1,pass\"", "good.conf"));

    let first = Location { line: 3, column: 9 };
    driver.error(&first, "syntax error", "");
    let second = Location { line: 5, column: 2 };
    driver.error(&second, "syntax error", "");

    let text = driver.diagnostics();
    assert!(text.starts_with("Rules error. File: good.conf. Line: 3. Column: 8. syntax error"));
    assert_eq!(text.matches("Rules error.").count(), 1);
    assert_eq!(text.matches("syntax error").count(), 2);
}

#[test]
fn error_context_is_appended_after_the_message() {
    let mut driver = Driver::new();
    assert!(driver.parse("SecAction \"id:1,phase:1,pass\"", "ctx.conf"));

    let location = Location { line: 2, column: 1 };
    driver.error(&location, "syntax error,", "unexpected token");
    assert!(driver
        .diagnostics()
        .contains("syntax error, unexpected token"));
}

#[test]
fn compiled_rules_survive_into_rules() {
    let mut driver = Driver::new();
    driver
        .add_sec_rule(detection(vec![Action::Id(11), Action::Phase(3)]))
        .unwrap();
    let rules = driver.into_rules();
    assert_eq!(rules.phase(3).unwrap()[0].id, 11);
}
