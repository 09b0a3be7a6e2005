#![forbid(unsafe_code)]
use chrono::NaiveDate;
use garde::{
    detect_conflicts, AssignedIdentity, AssignmentEngine, ConflictKind, Directory, EngineOptions,
    FairnessThreshold, IdentityResolver, LastAssigned, Member, MemberId, ResolveError, Role,
    RosterInput, RosterPlan, SchedError, SelfIdentity, Window,
};
use std::collections::BTreeSet;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// 2024-03-11 est un lundi
fn week() -> Window {
    Window::new(d(2024, 3, 11), d(2024, 3, 17)).unwrap()
}

fn input(window: Window, members: Vec<Member>) -> RosterInput {
    RosterInput::new(window, members).unwrap()
}

fn identities(plan: &RosterPlan, role: Role) -> Vec<String> {
    plan.track(role).iter().map(|b| b.identity.name.clone()).collect()
}

fn assert_sound(input: &RosterInput, plan: &RosterPlan, newcomers: &BTreeSet<MemberId>) {
    let conflicts = detect_conflicts(input, plan, newcomers);
    assert!(conflicts.is_empty(), "unexpected conflicts: {conflicts:?}");
}

#[test]
fn three_members_full_week() {
    let roster = input(
        week(),
        vec![Member::new("alice"), Member::new("bob"), Member::new("carol")],
    );
    let mut engine = AssignmentEngine::new(roster.clone(), &SelfIdentity).unwrap();
    let plan = engine.run().unwrap();

    assert_eq!(plan.primary.len(), 6);
    assert_eq!(plan.secondary.len(), 6);

    let weekend = &plan.primary[5];
    assert_eq!(weekend.start, d(2024, 3, 16));
    assert_eq!(weekend.end, d(2024, 3, 18));
    assert_eq!(weekend.duration_days(), 2);
    assert_eq!(plan.secondary[5].start, d(2024, 3, 16));

    assert_eq!(
        identities(&plan, Role::Primary),
        ["alice", "carol", "bob", "alice", "carol", "bob"]
    );
    assert_eq!(
        identities(&plan, Role::Secondary),
        ["bob", "alice", "carol", "bob", "alice", "carol"]
    );

    for role in [Role::Primary, Role::Secondary] {
        for pair in plan.track(role).windows(2) {
            assert_ne!(pair[0].identity, pair[1].identity);
        }
    }
    let seen: BTreeSet<_> = plan
        .primary
        .iter()
        .chain(plan.secondary.iter())
        .map(|b| b.member.clone())
        .collect();
    assert_eq!(seen.len(), 3);

    assert_sound(&roster, &plan, &BTreeSet::new());
}

#[test]
fn every_day_has_distinct_available_responders() {
    let window = Window::new(d(2024, 3, 11), d(2024, 4, 7)).unwrap();
    let members = vec![
        Member::new("alice").with_unavailable([d(2024, 3, 12), d(2024, 3, 16)]),
        Member::new("bob").with_unavailable([d(2024, 3, 17), d(2024, 3, 25)]),
        Member::new("carol"),
        Member::new("dave").with_unavailable([d(2024, 3, 20)]),
        Member::new("erin"),
    ];
    let roster = input(window, members);
    let plan = AssignmentEngine::new(roster.clone(), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    let daily = plan.daily();
    assert_eq!(daily.len() as i64, window.len_days());
    for day in daily {
        assert_ne!(day.primary.identity, day.secondary.identity);
        for block in [day.primary, day.secondary] {
            let member = roster.find_member(&block.member).unwrap();
            assert!(block.days().all(|x| member.is_available(x)));
        }
    }
    assert_sound(&roster, &plan, &BTreeSet::new());
}

#[test]
fn member_unavailable_all_window_never_assigned() {
    let window = Window::new(d(2024, 3, 11), d(2024, 4, 7)).unwrap();
    let bob = Member::new("bob").with_unavailable(window.days());
    let roster = input(
        window,
        vec![Member::new("alice"), bob, Member::new("carol"), Member::new("dave")],
    );
    let plan = AssignmentEngine::new(roster.clone(), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    let bob = MemberId::new("bob");
    assert!(plan.primary.iter().all(|b| b.member != bob));
    assert!(plan.secondary.iter().all(|b| b.member != bob));
    assert_eq!(plan.fairness.primary.shift_count[&bob], 0);
    assert_sound(&roster, &plan, &BTreeSet::new());
}

#[test]
fn fails_when_fewer_than_two_members_available() {
    let window = week();
    let roster = input(
        window,
        vec![
            Member::new("alice"),
            Member::new("bob").with_unavailable(window.days()),
        ],
    );
    let mut engine = AssignmentEngine::new(roster, &SelfIdentity).unwrap();
    let err = engine.run().unwrap_err();

    match err {
        SchedError::NoEligibleCandidate { date, role } => {
            assert_eq!(date, d(2024, 3, 11));
            assert_eq!(role, Role::Secondary);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.partial(Role::Primary).is_empty());
}

#[test]
fn failure_keeps_previous_blocks_for_diagnostics_only() {
    let window = Window::new(d(2024, 3, 11), d(2024, 3, 13)).unwrap();
    let roster = input(
        window,
        vec![
            Member::new("alice"),
            Member::new("bob").with_unavailable([d(2024, 3, 13)]),
            Member::new("carol").with_unavailable([d(2024, 3, 13)]),
        ],
    );
    let mut engine = AssignmentEngine::new(roster, &SelfIdentity).unwrap();
    let err = engine.run().unwrap_err();

    assert_eq!(err.date(), Some(d(2024, 3, 13)));
    assert!(matches!(
        err,
        SchedError::NoEligibleCandidate {
            role: Role::Secondary,
            ..
        }
    ));
    assert_eq!(engine.partial(Role::Primary).len(), 2);
    assert_eq!(engine.partial(Role::Secondary).len(), 2);
}

#[test]
fn lone_saturday_still_requires_sunday() {
    let saturday = Window::new(d(2024, 3, 16), d(2024, 3, 16)).unwrap();
    let alice = Member::new("alice").with_unavailable([d(2024, 3, 17)]);

    let pair = input(saturday, vec![alice.clone(), Member::new("bob")]);
    let err = AssignmentEngine::new(pair, &SelfIdentity)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        SchedError::NoEligibleCandidate { date, role: Role::Secondary } if date == d(2024, 3, 16)
    ));

    let trio = input(
        saturday,
        vec![alice, Member::new("bob"), Member::new("carol")],
    );
    let mut plan = AssignmentEngine::new(trio.clone(), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(plan.primary[0].member, MemberId::new("bob"));
    assert_eq!(plan.secondary[0].member, MemberId::new("carol"));
    assert_eq!(plan.primary[0].end, d(2024, 3, 17));
    assert_eq!(plan.fairness.primary.weekend_shift_count[&MemberId::new("bob")], 1);
    assert_sound(&trio, &plan, &BTreeSet::new());

    plan.primary[0].member = MemberId::new("alice");
    plan.primary[0].identity = SelfIdentity.resolve(&Member::new("alice")).unwrap();
    let conflicts = detect_conflicts(&trio, &plan, &BTreeSet::new());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Unavailable);
    assert_eq!(conflicts[0].date, d(2024, 3, 17));
}

#[test]
fn weekend_counter_pushes_saturday_to_another_member() {
    let window = Window::new(d(2024, 3, 11), d(2024, 3, 31)).unwrap();
    let members = (0..4).map(|i| Member::new(format!("m{i}"))).collect();
    let plan = AssignmentEngine::new(input(window, members), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    // m2 et m3 ont déjà tenu un week-end : m1 prend le troisième
    let third = &plan.primary[17];
    assert_eq!(third.start, d(2024, 3, 30));
    assert_eq!(third.member, MemberId::new("m1"));
    assert_eq!(plan.secondary[17].member, MemberId::new("m0"));

    for role in [Role::Primary, Role::Secondary] {
        let weekends = &plan.fairness.for_role(role).weekend_shift_count;
        assert!(weekends.values().all(|&n| n <= 1), "{role}: {weekends:?}");
        assert_eq!(weekends.values().sum::<u32>(), 3);
    }
}

#[test]
fn average_threshold_spreads_weekends() {
    let window = Window::new(d(2024, 3, 11), d(2024, 6, 30)).unwrap();
    let roster = input(window, (0..4).map(|i| Member::new(format!("m{i}"))).collect());

    let strict = AssignmentEngine::new(roster.clone(), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();
    let options = EngineOptions {
        fairness: FairnessThreshold::AveragePlusOne,
        ..EngineOptions::default()
    };
    let average = AssignmentEngine::new(roster.clone(), &SelfIdentity)
        .unwrap()
        .with_options(options)
        .unwrap()
        .run()
        .unwrap();

    assert_ne!(strict.primary, average.primary);
    assert_sound(&roster, &average, &BTreeSet::new());
    for role in [Role::Primary, Role::Secondary] {
        let counters = average.fairness.for_role(role);
        assert!(counters.weekend_shift_count.values().all(|&n| n >= 1));
        let shifts: Vec<u32> = counters.shift_count.values().copied().collect();
        let spread = shifts.iter().max().unwrap() - shifts.iter().min().unwrap();
        assert!(spread <= 3, "{role}: {shifts:?}");
    }
    assert!(strict
        .fairness
        .primary
        .weekend_shift_count
        .values()
        .any(|&n| n == 0));
}

#[test]
fn newcomer_flag_keeps_member_off_secondary() {
    let window = Window::new(d(2024, 3, 11), d(2024, 4, 7)).unwrap();
    let roster = input(
        window,
        vec![
            Member::new("alice"),
            Member::new("bob"),
            Member::new("carol"),
            Member::new("dave").as_newcomer(),
        ],
    );
    let plan = AssignmentEngine::new(roster.clone(), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    let dave = MemberId::new("dave");
    assert!(plan.secondary.iter().all(|b| b.member != dave));
    assert!(plan.primary.iter().any(|b| b.member == dave));
    assert!(!plan.fairness.secondary.shift_count.contains_key(&dave));
    assert_sound(&roster, &plan, &BTreeSet::from([dave]));
}

#[test]
fn injected_newcomers_match_flagged_ones() {
    let window = Window::new(d(2024, 3, 11), d(2024, 4, 7)).unwrap();
    let plain = vec![
        Member::new("alice"),
        Member::new("bob"),
        Member::new("carol"),
        Member::new("dave"),
    ];
    let mut flagged = plain.clone();
    flagged[3].newcomer = true;

    let injected = AssignmentEngine::new(input(window, plain), &SelfIdentity)
        .unwrap()
        .with_newcomers([MemberId::new("dave")])
        .run()
        .unwrap();
    let from_flag = AssignmentEngine::new(input(window, flagged), &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(injected.primary, from_flag.primary);
    assert_eq!(injected.secondary, from_flag.secondary);
}

#[test]
fn rerun_is_identical() {
    let window = Window::new(d(2024, 3, 11), d(2024, 5, 5)).unwrap();
    let members = (0..6)
        .map(|i| Member::new(format!("m{i}")).with_unavailable([d(2024, 3, 11 + i)]))
        .collect();
    let roster = input(window, members);

    let mut engine = AssignmentEngine::new(roster.clone(), &SelfIdentity).unwrap();
    let first = engine.run().unwrap();
    let second = engine.run().unwrap();
    let other = AssignmentEngine::new(roster, &SelfIdentity)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, other);
}

#[test]
fn uniform_availability_is_balanced() {
    let window = Window::new(d(2024, 3, 11), d(2024, 6, 30)).unwrap();
    for size in 3..=8 {
        let members = (0..size).map(|i| Member::new(format!("m{i}"))).collect();
        let plan = AssignmentEngine::new(input(window, members), &SelfIdentity)
            .unwrap()
            .run()
            .unwrap();

        for role in [Role::Primary, Role::Secondary] {
            let counts = &plan.fairness.for_role(role).shift_count;
            let max = counts.values().max().unwrap();
            let min = counts.values().min().unwrap();
            assert!(max - min <= 2, "{size} members, {role}: {counts:?}");
        }
    }
}

#[test]
fn history_seeds_anti_repeat() {
    let roster = input(
        week(),
        vec![Member::new("alice"), Member::new("bob"), Member::new("carol")],
    );
    let history = LastAssigned {
        primary: Some(SelfIdentity.resolve(&Member::new("alice")).unwrap()),
        secondary: None,
    };
    let plan = AssignmentEngine::new(roster, &SelfIdentity)
        .unwrap()
        .with_history(history)
        .run()
        .unwrap();

    assert_eq!(plan.primary[0].member, MemberId::new("bob"));
    assert_eq!(plan.secondary[0].member, MemberId::new("carol"));
}

#[test]
fn unresolvable_members_are_skipped() {
    let users = ["alice", "bob", "carol"]
        .into_iter()
        .map(|n| AssignedIdentity {
            name: n.to_string(),
            email: format!("{n}@example.com"),
            id: format!("P{}", n.to_uppercase()),
            kind: "user_reference".to_string(),
        })
        .collect();
    let directory = Directory::new(users);
    let roster = input(
        week(),
        vec![
            Member::new("ghost@example.com"),
            Member::new("alice@example.com"),
            Member::new("bob@example.com"),
            Member::new("carol@example.com"),
        ],
    );
    let plan = AssignmentEngine::new(roster, &directory)
        .unwrap()
        .run()
        .unwrap();

    let ghost = MemberId::new("ghost@example.com");
    assert!(plan.primary.iter().all(|b| b.member != ghost));
    assert!(plan.secondary.iter().all(|b| b.member != ghost));
    assert_eq!(plan.primary[0].identity.id, "PALICE");
}

struct Aliases;

impl IdentityResolver for Aliases {
    fn resolve(&self, member: &Member) -> Result<AssignedIdentity, ResolveError> {
        let name = match member.id.as_str() {
            "alias" => "alice",
            other => other,
        };
        Ok(AssignedIdentity {
            name: name.to_string(),
            ..AssignedIdentity::default()
        })
    }
}

#[test]
fn aliases_never_share_a_day() {
    let roster = input(
        week(),
        vec![
            Member::new("alice"),
            Member::new("alias"),
            Member::new("bob"),
            Member::new("carol"),
        ],
    );
    let plan = AssignmentEngine::new(roster.clone(), &Aliases)
        .unwrap()
        .run()
        .unwrap();
    for day in plan.daily() {
        assert_ne!(day.primary.identity, day.secondary.identity);
    }
    assert_sound(&roster, &plan, &BTreeSet::new());
}

#[test]
fn same_identity_everywhere_is_a_duplicate_assignment() {
    let window = Window::new(d(2024, 3, 11), d(2024, 3, 11)).unwrap();
    let roster = input(window, vec![Member::new("alice"), Member::new("alias")]);
    let err = AssignmentEngine::new(roster, &Aliases)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, SchedError::DuplicateAssignment { date } if date == d(2024, 3, 11)));
}

#[test]
fn construction_validates_input_and_options() {
    let empty = RosterInput {
        window: week(),
        members: Vec::new(),
    };
    assert!(matches!(
        AssignmentEngine::new(empty, &SelfIdentity),
        Err(SchedError::EmptyRoster)
    ));

    let duplicated = RosterInput {
        window: week(),
        members: vec![Member::new("alice"), Member::new("alice")],
    };
    assert!(matches!(
        AssignmentEngine::new(duplicated, &SelfIdentity),
        Err(SchedError::DuplicateMember(id)) if id == "alice"
    ));

    let reversed = RosterInput {
        window: Window {
            start: d(2024, 3, 17),
            end: d(2024, 3, 11),
        },
        members: vec![Member::new("alice")],
    };
    assert!(matches!(
        AssignmentEngine::new(reversed, &SelfIdentity),
        Err(SchedError::InvalidWindow { .. })
    ));

    let mut options = EngineOptions::default();
    options.weights.ceiling = 0;
    let roster = input(week(), vec![Member::new("alice"), Member::new("bob")]);
    assert!(matches!(
        AssignmentEngine::new(roster, &SelfIdentity)
            .unwrap()
            .with_options(options),
        Err(SchedError::InvalidOptions(_))
    ));
}
