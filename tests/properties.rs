//! Property tests for scheduling and history

use std::time::Duration;

use proptest::prelude::*;
use wbs_core::domain::{DependencyType, Project, Task, TaskDependency, TaskId};
use wbs_core::history::{ChangeRecorder, EditSession, HistoryStore};
use wbs_core::schedule::{compute_schedule, Placement, ScheduleContext, ScheduleMode};

fn dep_type() -> impl Strategy<Value = DependencyType> {
    prop_oneof![
        Just(DependencyType::FinishToStart),
        Just(DependencyType::StartToStart),
        Just(DependencyType::FinishToFinish),
        Just(DependencyType::StartToFinish),
    ]
}

/// Tasks with durations plus forward-only links (always acyclic)
fn dag() -> impl Strategy<Value = (Vec<Task>, Vec<TaskDependency>)> {
    (2usize..12).prop_flat_map(|n| {
        let durations = prop::collection::vec(1u32..10, n);
        let links = prop::collection::vec((0..n, 0..n, dep_type(), -5i32..6), 0..(n * 2));
        (durations, links).prop_map(move |(durations, links)| {
            let tasks: Vec<Task> = durations
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let mut task = Task::new(
                        format!("t-{:07}", i).parse().unwrap(),
                        format!("Task {}", i),
                        "todo".parse().unwrap(),
                    );
                    task.duration = Some(*d);
                    task
                })
                .collect();

            let deps = links
                .into_iter()
                .filter(|(a, b, _, _)| a < b)
                .enumerate()
                .map(|(k, (a, b, dep_type, lag))| {
                    TaskDependency::new(
                        format!("d-{:07}", k).parse().unwrap(),
                        tasks[a].id.clone(),
                        tasks[b].id.clone(),
                        dep_type,
                        lag,
                    )
                })
                .collect();
            (tasks, deps)
        })
    })
}

fn satisfies(pred: Placement, succ: Placement, dep: &TaskDependency) -> bool {
    let lag = i64::from(dep.lag);
    match dep.dep_type {
        DependencyType::FinishToStart => succ.relative_start == pred.end() + lag,
        DependencyType::StartToStart => succ.relative_start == pred.relative_start + lag,
        DependencyType::FinishToFinish => succ.end() == pred.end() + lag,
        DependencyType::StartToFinish => succ.end() == pred.relative_start + lag,
    }
}

fn renamed(project: &Project, name: String) -> Project {
    let mut next = project.clone();
    next.name = name;
    next
}

proptest! {
    #[test]
    fn last_link_into_each_task_holds((tasks, deps) in dag()) {
        let schedule = compute_schedule(&tasks, &deps, ScheduleMode::Relative, &ScheduleContext::default());
        prop_assert!(schedule.issues.is_empty());

        for task in &tasks {
            let entry = schedule.get(&task.id).unwrap();
            let bar = entry.placement.unwrap();
            prop_assert_eq!(bar.duration, i64::from(task.duration.unwrap()));

            let incoming: Vec<&TaskDependency> =
                deps.iter().filter(|d| d.successor_id == task.id).collect();
            match incoming.last() {
                Some(last) => {
                    let pred = schedule.get(&last.predecessor_id).unwrap().placement.unwrap();
                    prop_assert!(satisfies(pred, bar, last), "{:?} violated", last);
                }
                None => prop_assert_eq!(bar.relative_start, 0),
            }
        }
    }

    #[test]
    fn schedule_is_deterministic((tasks, deps) in dag()) {
        let ctx = ScheduleContext::default();
        let first = compute_schedule(&tasks, &deps, ScheduleMode::Relative, &ctx);
        let second = compute_schedule(&tasks, &deps, ScheduleMode::Relative, &ctx);
        prop_assert_eq!(first.tasks.len(), tasks.len());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn history_is_bounded(pushes in 0usize..120, capacity in 1usize..60) {
        let base = Project::new("p");
        let mut history = HistoryStore::with_capacity(capacity);
        for i in 0..pushes {
            history.push_state(&renamed(&base, format!("push {}", i)));
        }

        prop_assert_eq!(history.past_len(), pushes.min(capacity));
        if pushes > 0 {
            let oldest = history.past().next().unwrap();
            prop_assert_eq!(&oldest.name, &format!("push {}", pushes - pushes.min(capacity)));
        }
    }

    #[test]
    fn undo_then_redo_restores_every_state(steps in 1usize..20) {
        let mut project = Project::new("p");
        let mut history = HistoryStore::new();
        let mut states = vec![project.clone()];
        for i in 0..steps {
            history.push_state(&project);
            project = renamed(&project, format!("v{}", i));
            states.push(project.clone());
        }

        for expected in states.iter().rev().skip(1) {
            project = history.undo(&project).unwrap();
            prop_assert_eq!(&project, expected);
        }
        prop_assert!(!history.can_undo());

        for expected in states.iter().skip(1) {
            project = history.redo(&project).unwrap();
            prop_assert_eq!(&project, expected);
        }
        prop_assert!(!history.can_redo());
    }

    #[test]
    fn quiet_gaps_split_bursts(gaps in prop::collection::vec(1u64..700, 1..40)) {
        let delay = Duration::from_millis(300);
        let mut recorder = ChangeRecorder::new(delay);
        let mut history = HistoryStore::new();
        let mut project = Project::new("p");
        let mut now = Duration::ZERO;
        recorder.observe(&project, now, &mut history);

        for (i, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            project = renamed(&project, format!("edit {}", i));
            recorder.observe(&project, now, &mut history);
        }
        recorder.poll(now + delay, &mut history);

        // The first edit opens a burst; every later edit after a quiet
        // period of at least `delay` opens another
        let bursts = 1 + gaps[1..].iter().filter(|g| **g >= 300).count();
        prop_assert_eq!(history.past_len(), bursts);
        prop_assert!(!recorder.has_pending());
    }

    #[test]
    fn session_undo_returns_to_opening_state(edits in 1usize..10) {
        let original = Project::new("p");
        let mut session = EditSession::new(original.clone(), Duration::ZERO);
        for i in 0..edits {
            let now = Duration::from_millis(i as u64 * 10);
            session.edit(now, |p| p.name = format!("typing {}", i));
        }

        // Rapid edits form one step, undone in one go
        prop_assert!(session.undo(Duration::from_millis(100)));
        prop_assert_eq!(session.project(), &original);
        prop_assert!(!session.can_undo());
        prop_assert!(session.can_redo());
    }
}

#[test]
fn scenario_chain_from_dated_predecessor() {
    let b: TaskId = "t-bbbbbbb".parse().unwrap();
    let c: TaskId = "t-ccccccc".parse().unwrap();
    let tasks = vec![
        Task::new("t-aaaaaaa".parse().unwrap(), "A", "todo".parse().unwrap()),
        Task::new(b.clone(), "B", "todo".parse().unwrap()).with_dates(
            "2024-01-01".parse().unwrap(),
            "2024-01-03".parse().unwrap(),
        ),
        Task::new(c.clone(), "C", "todo".parse().unwrap()),
    ];
    let deps = vec![TaskDependency::new(
        "d-0000001".parse().unwrap(),
        b,
        c.clone(),
        DependencyType::FinishToStart,
        0,
    )];

    let schedule = compute_schedule(&tasks, &deps, ScheduleMode::Absolute, &ScheduleContext::default());
    let entry = schedule.get(&c).unwrap();
    assert_eq!(entry.start_date, Some("2024-01-04".parse().unwrap()));
}
