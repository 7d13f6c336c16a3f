use chrono::{Duration, NaiveDate};
use phasely_core::{
    capacity, phase_for_date, phase_for_date_advanced, schedule_task, Cycle, EnergyLevel, Phase,
    PhaseWindows, Task, UserPreferences,
};
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn phase_index(p: Phase) -> usize {
    Phase::ALL.iter().position(|x| *x == p).unwrap()
}

fn energy_strategy() -> impl Strategy<Value = Option<EnergyLevel>> {
    prop_oneof![
        Just(None),
        Just(Some(EnergyLevel::Low)),
        Just(Some(EnergyLevel::Medium)),
        Just(Some(EnergyLevel::High)),
    ]
}

proptest! {
    #[test]
    fn prop_windows_cover_cycle_in_order(m in 1u32..=13, extra in 15u32..=40) {
        let l = (m + extra).max(16);
        let start = base_date();
        let windows = PhaseWindows::compute(start, m, l);

        let mut last = 0usize;
        for day in 0..l as i64 {
            let phase = windows.phase_of(start + Duration::days(day));
            prop_assert!(phase.is_some(), "day {} uncovered", day + 1);
            let idx = phase_index(phase.unwrap());
            prop_assert!(idx >= last);
            last = idx;
        }
        prop_assert_eq!(windows.phase_of(start + Duration::days(l as i64)), None);
        prop_assert_eq!(windows.phase_of(start - Duration::days(1)), None);
    }

    #[test]
    fn prop_each_phase_visited_once_contiguously(m in 1u32..=12, extra in 15u32..=40) {
        let l = m + extra;
        let start = base_date();
        let cycle = Cycle::new("c", start, None)
            .with_menstrual_days(m)
            .with_cycle_length(l);

        let mut runs: Vec<Phase> = Vec::new();
        for day in 0..l as i64 {
            let phase = phase_for_date(start + Duration::days(day), &cycle).unwrap();
            if runs.last() != Some(&phase) {
                runs.push(phase);
            }
        }
        prop_assert_eq!(runs, Phase::ALL.to_vec());
    }

    #[test]
    fn prop_logged_cycle_always_wins(offset in 0i64..28, second_gap in 21i64..45) {
        let first = Cycle::new("a", base_date(), None)
            .with_menstrual_days(5)
            .with_cycle_length(28);
        // A second logged cycle far away must not change lookups inside the first.
        let second = Cycle::new("b", base_date() + Duration::days(28 + second_gap), None);
        let date = base_date() + Duration::days(offset);
        let cycles = vec![second, first.clone()];
        prop_assert_eq!(phase_for_date_advanced(date, &cycles), phase_for_date(date, &first));
    }

    #[test]
    fn prop_capacity_at_least_one(base in 0u32..50) {
        for phase in Phase::ALL {
            prop_assert!(capacity(phase, base) >= 1);
        }
    }

    #[test]
    fn prop_schedule_respects_today_and_deadline(
        deadline_in in 1i64..40,
        energy in energy_strategy(),
        busy in proptest::collection::vec(0i64..40, 0..30),
        with_cycle in any::<bool>()
    ) {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let deadline = today + Duration::days(deadline_in);

        let mut task = Task::new("t", "subject").with_deadline(deadline);
        task.energy_level = energy;

        let existing: Vec<Task> = busy
            .iter()
            .enumerate()
            .map(|(i, off)| Task::new(format!("e{i}"), "busy").scheduled_on(today + Duration::days(*off)))
            .collect();
        let cycles = if with_cycle {
            vec![Cycle::new("c", base_date(), None).with_menstrual_days(5).with_cycle_length(28)]
        } else {
            vec![]
        };

        let date = schedule_task(&task, &existing, &cycles, &UserPreferences::default(), today);
        prop_assert!(date >= today);
        prop_assert!(date < deadline);
    }
}
