// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Process-wide accounting of the time spent in oracle calls.

use std::{
    fmt::Write,
    sync::Mutex,
    time::{Duration, Instant},
};

use itertools::Itertools;
use lazy_static::lazy_static;

use crate::basics::SolveResult;

/// The kind of a timed oracle call, by its outcome.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimeType {
    /// The call found a witness
    Sat,
    /// The call proved unsatisfiability
    Unsat,
    /// The call gave up
    Unknown,
}

impl TimeType {
    const ALL: [TimeType; 3] = [TimeType::Unsat, TimeType::Sat, TimeType::Unknown];

    fn name(&self) -> &'static str {
        match self {
            TimeType::Sat => "oracle (sat)",
            TimeType::Unsat => "oracle (unsat)",
            TimeType::Unknown => "oracle (unknown)",
        }
    }
}

impl From<&SolveResult> for TimeType {
    fn from(res: &SolveResult) -> Self {
        match res {
            SolveResult::Sat(_) => TimeType::Sat,
            SolveResult::Unsat => TimeType::Unsat,
            SolveResult::Unknown(_) => TimeType::Unknown,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct TimeInfo {
    typ: TimeType,
    dur: Duration,
}

/// A record of timing measurements, shareable between threads.
pub struct Timings {
    times: Mutex<Vec<TimeInfo>>,
    created: Instant,
}

impl Timings {
    #[allow(clippy::new_without_default)]
    /// An empty record whose total time starts now.
    pub fn new() -> Self {
        Timings {
            times: Mutex::new(vec![]),
            created: Instant::now(),
        }
    }

    /// Record a call of kind `typ` that started at `start`.
    pub fn elapsed(&self, typ: TimeType, start: Instant) {
        let dur = start.elapsed();
        self.times.lock().unwrap().push(TimeInfo { typ, dur });
    }

    /// Number of calls recorded so far.
    pub fn calls(&self) -> usize {
        self.times.lock().unwrap().len()
    }

    /// A human-readable breakdown of where the time went.
    pub fn report(&self) -> String {
        let total_time = self.created.elapsed().as_secs_f64();
        let times = self.times.lock().unwrap().clone();
        let count = times.len();
        let oracle_total = times
            .iter()
            .map(|info| info.dur)
            .sum::<Duration>()
            .as_secs_f64();

        let mut out = String::new();
        _ = writeln!(out, "{:<22}: {total_time:.3}s", "total");
        _ = writeln!(out, "  {:<20}: {:.3}s", "non-oracle", total_time - oracle_total);
        _ = writeln!(out, "  {:<20}: {oracle_total:.3}s {count:>4} calls", "oracle total");

        let totals = times
            .iter()
            .into_grouping_map_by(|info| info.typ)
            .fold((Duration::ZERO, 0), |(dur, count), _key, t| {
                (dur + t.dur, count + 1)
            });
        for typ in TimeType::ALL {
            let (time, count) = totals.get(&typ).unwrap_or(&(Duration::ZERO, 0));
            if *count > 0 {
                _ = writeln!(
                    out,
                    "    {:<18}: {:.3}s {count:>4} calls",
                    typ.name(),
                    time.as_secs_f64()
                );
            }
        }
        out
    }
}

lazy_static! {
    /// The global record every oracle reports into.
    pub static ref TIMES: Timings = Timings::new();
}

/// Start the clock of [`TIMES`] now rather than at the first call.
pub fn init() {
    lazy_static::initialize(&TIMES);
}

/// Mark the start of a timed call.
pub fn start() -> Instant {
    Instant::now()
}

/// Record a call in [`TIMES`].
pub fn elapsed(typ: TimeType, start: Instant) {
    TIMES.elapsed(typ, start)
}

/// The report of [`TIMES`].
pub fn report() -> String {
    if cfg!(debug_assertions) {
        log::warn!("this is a debug build, non-oracle time will be worse");
    }
    TIMES.report()
}
