//! Schedule computation
//!
//! Pure function over borrowed tasks and dependencies. Steps:
//! 1. drop self links and links naming unknown tasks (reported)
//! 2. find cycles; cycle members and everything downstream of them keep
//!    their own placement
//! 3. walk the remaining DAG in topological order (ties broken by task
//!    order), applying each task's incoming links in dependency order

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use chrono::NaiveDate;

use super::{
    offset_date, Placement, PlacementSource, Schedule, ScheduleContext, ScheduleIssue,
    ScheduleMode, ScheduledTask,
};
use crate::domain::{find_cycles, Task, TaskDependency, TaskId};

/// Computes placements for all tasks.
///
/// Never mutates its inputs and never fails: problems are collected in
/// [`Schedule::issues`] and the affected links are skipped.
pub fn compute_schedule(
    tasks: &[Task],
    dependencies: &[TaskDependency],
    mode: ScheduleMode,
    ctx: &ScheduleContext,
) -> Schedule {
    let mut issues = Vec::new();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        index.entry(task.id.as_str()).or_insert(i);
    }

    // (dependency, predecessor index, successor index)
    let mut links: Vec<(&TaskDependency, usize, usize)> = Vec::with_capacity(dependencies.len());
    for dep in dependencies {
        if dep.predecessor_id == dep.successor_id {
            issues.push(ScheduleIssue::SelfDependency {
                dependency: dep.id.clone(),
                task: dep.predecessor_id.clone(),
            });
            continue;
        }
        let pred = index.get(dep.predecessor_id.as_str()).copied();
        let succ = index.get(dep.successor_id.as_str()).copied();
        match (pred, succ) {
            (Some(p), Some(s)) => links.push((dep, p, s)),
            (None, _) => issues.push(ScheduleIssue::UnknownTaskReference {
                dependency: dep.id.clone(),
                task: dep.predecessor_id.clone(),
            }),
            (_, None) => issues.push(ScheduleIssue::UnknownTaskReference {
                dependency: dep.id.clone(),
                task: dep.successor_id.clone(),
            }),
        }
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (_, p, s) in &links {
        successors[*p].push(*s);
    }

    let cycles = find_cycles(tasks, links.iter().map(|(d, _, _)| *d));
    let isolated = downstream_of_cycles(&cycles, &index, &successors);
    issues.extend(
        cycles
            .into_iter()
            .map(|task_ids| ScheduleIssue::CyclicDependency { task_ids }),
    );
    links.retain(|(_, _, s)| !isolated.contains(s));

    let origin = ctx
        .range
        .map(|r| r.start_date)
        .or_else(|| {
            tasks
                .iter()
                .filter_map(|t| own_start(t, ctx.default_duration))
                .min()
        });

    let mut bars: Vec<Option<Placement>> = Vec::with_capacity(tasks.len());
    let mut sources: Vec<PlacementSource> = Vec::with_capacity(tasks.len());
    for task in tasks {
        let (bar, source) = own_placement(task, origin, mode, ctx);
        bars.push(bar);
        sources.push(source);
    }

    // Incoming links per successor, kept in dependency sequence order
    let mut incoming: Vec<Vec<(&TaskDependency, usize)>> = vec![Vec::new(); tasks.len()];
    let mut in_degree = vec![0usize; tasks.len()];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (dep, p, s) in &links {
        incoming[*s].push((dep, *p));
        outgoing[*p].push(*s);
        in_degree[*s] += 1;
    }

    for node in topological_order(&in_degree, &outgoing) {
        for (dep, p) in &incoming[node] {
            let Some(anchor_bar) = bars[*p] else {
                issues.push(ScheduleIssue::MissingAnchor {
                    dependency: dep.id.clone(),
                    task: dep.predecessor_id.clone(),
                });
                continue;
            };

            let duration = bars[node]
                .map(|b| b.duration)
                .or_else(|| tasks[node].span_days())
                .unwrap_or(i64::from(ctx.default_duration));

            bars[node] = Some(constrain(anchor_bar, dep, duration));
            sources[node] = PlacementSource::Dependency(dep.id.clone());
        }
    }

    let tasks = tasks
        .iter()
        .zip(bars)
        .zip(sources)
        .map(|((task, bar), source)| {
            let dated = match (mode, origin, bar) {
                (ScheduleMode::Absolute, Some(origin), Some(bar)) => dates_of(origin, bar),
                _ => None,
            };
            ScheduledTask {
                task_id: task.id.clone(),
                placement: bar,
                source,
                start_date: dated.map(|(s, _)| s),
                end_date: dated.map(|(_, e)| e),
            }
        })
        .collect();

    Schedule {
        mode,
        origin,
        tasks,
        issues,
    }
}

/// First day implied by the task's own fields.
///
/// An end date without a start or duration ends a bar of the default length.
fn own_start(task: &Task, default_duration: u32) -> Option<NaiveDate> {
    task.effective_start().or_else(|| {
        let end = task.end_date?;
        let days = task.span_days().unwrap_or(i64::from(default_duration));
        offset_date(end, 1 - days)
    })
}

/// The task's placement from its own fields
fn own_placement(
    task: &Task,
    origin: Option<NaiveDate>,
    mode: ScheduleMode,
    ctx: &ScheduleContext,
) -> (Option<Placement>, PlacementSource) {
    let duration = task
        .span_days()
        .unwrap_or(i64::from(ctx.default_duration));

    let start = match (own_start(task, ctx.default_duration), origin) {
        (Some(start), Some(origin)) => Some((start - origin).num_days()),
        _ => None,
    };

    match (start, mode) {
        (Some(relative_start), _) => (
            Some(Placement {
                relative_start,
                duration,
            }),
            PlacementSource::Explicit,
        ),
        (None, ScheduleMode::Relative) => (
            Some(Placement {
                relative_start: 0,
                duration,
            }),
            PlacementSource::Default,
        ),
        (None, ScheduleMode::Absolute) => (None, PlacementSource::Unscheduled),
    }
}

/// Places a successor of length `duration` against its predecessor's bar
fn constrain(predecessor: Placement, dep: &TaskDependency, duration: i64) -> Placement {
    let anchor = if dep.dep_type.reads_predecessor_end() {
        predecessor.end()
    } else {
        predecessor.relative_start
    };
    let target = anchor + i64::from(dep.lag);

    let relative_start = if dep.dep_type.pins_successor_end() {
        target - duration
    } else {
        target
    };

    Placement {
        relative_start,
        duration,
    }
}

/// Cycle members plus every task reachable from them
fn downstream_of_cycles(
    cycles: &[Vec<TaskId>],
    index: &HashMap<&str, usize>,
    successors: &[Vec<usize>],
) -> HashSet<usize> {
    let mut isolated = HashSet::new();
    let mut queue: VecDeque<usize> = cycles
        .iter()
        .flatten()
        .filter_map(|id| index.get(id.as_str()).copied())
        .collect();

    while let Some(node) = queue.pop_front() {
        if isolated.insert(node) {
            queue.extend(successors[node].iter().copied());
        }
    }

    isolated
}

/// Kahn's algorithm; ready tasks are taken in input order
fn topological_order(in_degree: &[usize], outgoing: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree = in_degree.to_vec();
    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &outgoing[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    order
}

fn dates_of(origin: NaiveDate, bar: Placement) -> Option<(NaiveDate, NaiveDate)> {
    let start = offset_date(origin, bar.relative_start)?;
    let end = offset_date(origin, bar.end() - 1)?;
    Some((start, end))
}
