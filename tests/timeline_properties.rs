use lecture_graph::graph::{project, resolve_active, Concept, Relationship, TimelineIndex};

/// Small deterministic generator so every run checks the same lectures
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    /// Coarse timestamps so duplicates are common
    fn timestamp(&mut self) -> f64 {
        (self.next() % 40) as f64 * 7.5
    }
}

fn random_lecture(rng: &mut Lcg) -> Vec<Concept> {
    let len = 1 + (rng.next() % 25) as usize;
    (0..len)
        .map(|i| Concept::new(format!("c{}", i), format!("Concept {}", i), rng.timestamp()))
        .collect()
}

fn timestamp_of(concepts: &[Concept], id: &str) -> f64 {
    concepts
        .iter()
        .find(|c| c.id.as_str() == id)
        .map(|c| c.timestamp)
        .unwrap()
}

#[test]
fn test_none_before_first_timestamp() {
    let mut rng = Lcg(7);
    for _ in 0..200 {
        let concepts = random_lecture(&mut rng);
        let min = concepts.iter().map(|c| c.timestamp).fold(f64::INFINITY, f64::min);

        for t in [min - 0.001, min - 1.0, -1.0e9] {
            assert_eq!(resolve_active(&concepts, t), None);
            assert!(TimelineIndex::new(&concepts).active(t).is_none());
        }
    }
}

#[test]
fn test_last_maximum_after_final_timestamp() {
    let mut rng = Lcg(11);
    for _ in 0..200 {
        let concepts = random_lecture(&mut rng);
        let max = concepts.iter().map(|c| c.timestamp).fold(f64::NEG_INFINITY, f64::max);
        // the last concept in input order carrying the maximum timestamp
        let expected = concepts.iter().rev().find(|c| c.timestamp == max).unwrap();

        for t in [max, max + 0.5, 1.0e9] {
            assert_eq!(resolve_active(&concepts, t), Some(&expected.id));
            assert_eq!(TimelineIndex::new(&concepts).active_id(t), Some(&expected.id));
        }
    }
}

#[test]
fn test_resolution_is_monotonic_in_time() {
    let mut rng = Lcg(23);
    for _ in 0..100 {
        let concepts = random_lecture(&mut rng);
        let mut previous: Option<f64> = None;

        let mut t = -5.0;
        while t <= 310.0 {
            let current = resolve_active(&concepts, t).map(|id| timestamp_of(&concepts, id.as_str()));
            match (previous, current) {
                (Some(p), Some(c)) => assert!(p <= c, "active timestamp went back from {} to {}", p, c),
                (Some(_), None) => panic!("active concept disappeared at {}", t),
                _ => {}
            }
            previous = current;
            t += 1.25;
        }
    }
}

#[test]
fn test_project_preserves_count() {
    let mut rng = Lcg(3);
    assert!(project(&[]).is_empty());

    for _ in 0..50 {
        let len = (rng.next() % 30) as usize;
        let rels: Vec<Relationship> = (0..len)
            .map(|_| {
                Relationship::new(
                    format!("c{}", rng.next() % 5),
                    format!("c{}", rng.next() % 5),
                )
            })
            .collect();

        let edges = project(&rels);
        assert_eq!(edges.len(), rels.len());
        for (edge, rel) in edges.iter().zip(&rels) {
            assert_eq!(edge.source, rel.source_id);
            assert_eq!(edge.target, rel.target_id);
        }
    }
}
