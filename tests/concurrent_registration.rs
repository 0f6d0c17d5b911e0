use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use heuristic_population::{Admission, Candidate, Population, PopulationConfig};

fn population(capacity: usize) -> Population<String> {
    Population::new(PopulationConfig {
        capacity,
        seed: Some(11),
        ..PopulationConfig::default()
    })
    .unwrap()
}

#[test]
fn one_survival_step_for_exactly_capacity_registrations() {
    const CAPACITY: usize = 64;
    const THREADS: usize = 8;

    let pop = Arc::new(population(CAPACITY));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pop = Arc::clone(&pop);
            thread::spawn(move || {
                (0..CAPACITY / THREADS)
                    .map(|i| {
                        let n = (t * CAPACITY / THREADS + i) as f64;
                        pop.register(Candidate::new(format!("h{t}-{i}"), vec![n, -n]))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let registrations: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert!(registrations
        .iter()
        .all(|r| r.admission == Admission::Accepted));
    assert_eq!(registrations.iter().filter(|r| r.survival.is_some()).count(), 1);
    assert_eq!(pop.generation(), 1);
    assert_eq!(pop.len(), CAPACITY);
    assert_eq!(pop.pending_len(), 0);

    let names: HashSet<String> = pop
        .members()
        .into_iter()
        .map(Candidate::into_representation)
        .collect();
    assert_eq!(names.len(), CAPACITY);
}

#[test]
fn concurrent_duplicates_admit_a_single_original() {
    const THREADS: usize = 16;

    let pop = Arc::new(population(THREADS + 1));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pop = Arc::clone(&pop);
            thread::spawn(move || pop.register(Candidate::new("same".to_string(), vec![1.0, 2.0])))
        })
        .collect();

    let admissions: Vec<Admission> = handles
        .into_iter()
        .map(|h| h.join().unwrap().admission)
        .collect();

    let accepted = admissions.iter().filter(|a| **a == Admission::Accepted).count();
    let duplicates = admissions.iter().filter(|a| **a == Admission::Duplicate).count();
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, THREADS - 1);
    assert_eq!(pop.pending_len(), THREADS);
}

#[test]
fn capacity_holds_under_sustained_load() {
    const CAPACITY: usize = 10;

    let pop = Arc::new(population(CAPACITY));

    let readers_done = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let reader = {
        let pop = Arc::clone(&pop);
        let done = Arc::clone(&readers_done);
        thread::spawn(move || {
            while !done.load(std::sync::atomic::Ordering::SeqCst) {
                assert!(pop.members().len() <= CAPACITY);
                if let Ok(parent) = pop.select_parent() {
                    assert!(parent.score().is_valid());
                }
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let pop = Arc::clone(&pop);
            thread::spawn(move || {
                for i in 0..250 {
                    let x = ((t * 250 + i) as f64 * 0.01).cos();
                    let candidate = if i % 7 == 0 {
                        Candidate::unscored(format!("w{t}-{i}"))
                    } else {
                        Candidate::new(format!("w{t}-{i}"), vec![x, 1.0 - x.abs()])
                    };
                    pop.register(candidate);
                }
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    readers_done.store(true, std::sync::atomic::Ordering::SeqCst);
    reader.join().unwrap();

    let stats = pop.stats();
    assert_eq!(stats.survival_failures, 0);
    assert_eq!(
        stats.registered,
        pop.generation() * CAPACITY as u64 + pop.pending_len() as u64
    );
    assert_eq!(stats.registered + stats.discarded, 1000);
    assert_eq!(pop.len(), CAPACITY);
}
