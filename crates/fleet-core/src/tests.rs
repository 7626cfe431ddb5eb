//! Unit tests for fleet-core.

// ── Typed ids ─────────────────────────────────────────────────────────────────

mod ids {
    use crate::{AgentId, NameId, NodeId};

    #[test]
    fn invalid_sentinel_is_default() {
        assert_eq!(NodeId::default(), NodeId::INVALID);
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(AgentId::INVALID.0, u8::MAX);
    }

    #[test]
    fn empty_name_is_id_zero() {
        assert!(NameId::EMPTY.is_empty());
        assert_eq!(NameId::EMPTY.index(), 0);
        assert!(!NameId(3).is_empty());
    }

    #[test]
    fn usize_round_trip() {
        let id = NodeId::try_from(42usize).unwrap();
        assert_eq!(usize::from(id), 42);
        assert!(AgentId::try_from(1_000usize).is_err());
    }
}

// ── Intern tables ─────────────────────────────────────────────────────────────

mod intern {
    use crate::{NameId, NameTable};

    #[test]
    fn register_round_trip() {
        let mut t = NameTable::new();
        let id = t.register("shop1");
        assert_eq!(t.string_of(id), "shop1");
        assert_eq!(t.lookup("shop1"), id);
    }

    #[test]
    fn register_is_idempotent() {
        let mut t = NameTable::new();
        let a = t.register("workshop3");
        let b = t.register("workshop3");
        assert_eq!(a, b);
        assert_eq!(t.len(), 2); // "" + workshop3
    }

    #[test]
    fn empty_string_maps_to_zero() {
        let mut t = NameTable::new();
        assert_eq!(t.register(""), NameId::EMPTY);
        assert_eq!(t.lookup(""), NameId::EMPTY);
        assert_eq!(t.string_of(NameId::EMPTY), "");
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let mut t = NameTable::new();
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            let id = t.register(&format!("facility{i}"));
            assert!(seen.insert(id), "id collision for facility{i}");
            assert_ne!(id, NameId::EMPTY);
        }
        // All still resolvable after the table filled up a fair bit.
        for i in 0..200 {
            let name = format!("facility{i}");
            assert_eq!(t.string_of(t.lookup(&name)), name);
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let mut t = NameTable::new();
        for i in 0..255 {
            t.register(&format!("n{i}"));
        }
        assert!(t.try_register("one-too-many").is_err());
    }

    #[test]
    #[should_panic(expected = "never registered")]
    fn lookup_asserts_presence() {
        let t = NameTable::new();
        t.lookup("ghost");
    }

    #[test]
    fn job_table_is_independent() {
        let mut names = NameTable::new();
        let mut jobs = crate::JobTable::new();
        names.register("job17"); // same spelling, different namespace
        let j = jobs.register("job17");
        assert_eq!(jobs.string_of(j), "job17");
    }
}

// ── Map bounds & lattice positions ───────────────────────────────────────────

mod pos {
    use crate::{MapBounds, Pos};

    fn bounds() -> MapBounds {
        // Roughly the London 2017 contest map.
        MapBounds::new(51.4625, 51.5475, -0.1978, -0.0354)
    }

    #[test]
    fn affine_round_trip_within_one_ulp() {
        let b = bounds();
        for &(lat, lon) in &[
            (51.4700, -0.1000),
            (51.5475, -0.0354), // corner
            (51.4625, -0.1978), // corner
            (51.5001, -0.1203),
        ] {
            let p = b.pos(lat, lon);
            let (rlat, rlon) = b.degrees(p);
            let p2 = b.pos(rlat, rlon);
            assert!((p.lat as i32 - p2.lat as i32).abs() <= 1, "{lat},{lon}");
            assert!((p.lon as i32 - p2.lon as i32).abs() <= 1, "{lat},{lon}");
        }
    }

    #[test]
    fn padding_ring_accepts_out_of_box_points() {
        let b = bounds();
        // A little outside the raw bounding box but inside the padding ring.
        let p = b.pos(51.4600, -0.2000);
        assert!(p.lat > 0 && p.lon > 0);
    }

    #[test]
    fn dist_air_is_symmetric_and_scales() {
        let b = bounds();
        let a = b.pos(51.4700, -0.1000);
        let c = b.pos(51.4700, -0.0900);
        assert_eq!(b.dist_air(a, c), b.dist_air(c, a));
        // ~0.01° of longitude at 51.5° N is roughly 690 m.
        let d = b.dist_air(a, c);
        assert!((500.0..900.0).contains(&d), "got {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let b = bounds();
        let p = Pos::new(1000, 2000);
        assert_eq!(b.dist_air(p, p), 0.0);
    }
}

// ── Arena & flat arrays ───────────────────────────────────────────────────────

mod arena {
    use crate::arena::{Arena, FlatArray};
    use crate::Pos;

    #[test]
    fn emplace_get_round_trip() {
        let mut a = Arena::new();
        let o1 = a.emplace(0xdead_beefu32);
        let o2 = a.emplace(Pos::new(7, 9));
        assert_eq!(a.get::<u32>(o1), 0xdead_beef);
        assert_eq!(a.get::<Pos>(o2), Pos::new(7, 9));
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut a = Arena::new();
        let o = a.emplace(1u32);
        a.set(o, 2u32);
        assert_eq!(a.get::<u32>(o), 2);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn flat_array_push_and_iterate() {
        let mut a = Arena::new();
        let arr: FlatArray<u32> = FlatArray::emplace(&mut a);
        for i in 0..5u32 {
            arr.push(&mut a, i * 10);
        }
        assert_eq!(arr.len(&a), 5);
        let got: Vec<u32> = arr.iter(&a).collect();
        assert_eq!(got, vec![0, 10, 20, 30, 40]);
        assert_eq!(arr.get(&a, 3), 30);
    }

    #[test]
    fn flat_array_embedded_in_record() {
        // Record layout: [tag: u32][geo header: u8][...tail: size word + elems]
        let mut a = Arena::new();
        let _tag = a.emplace(77u32);
        let head = a.emplace(0u8);
        let geo: FlatArray<Pos, u8, u8> = FlatArray::init_at(&mut a, head);
        geo.push(&mut a, Pos::new(1, 2));
        geo.push(&mut a, Pos::new(3, 4));
        // Re-view through the raw header offset, as a reader would.
        let view: FlatArray<Pos, u8, u8> = FlatArray::at(head);
        assert_eq!(view.len(&a), 2);
        assert_eq!(view.get(&a, 1), Pos::new(3, 4));
    }

    #[test]
    #[should_panic(expected = "arena tail")]
    fn push_off_tail_is_rejected() {
        let mut a = Arena::new();
        let arr: FlatArray<u32> = FlatArray::emplace(&mut a);
        arr.push(&mut a, 1);
        a.emplace(9u8); // something else now owns the tail
        arr.push(&mut a, 2);
    }

    #[test]
    #[should_panic(expected = "trap_alloc")]
    fn trap_alloc_fires_on_overrun() {
        let mut a = Arena::with_capacity(4);
        a.set_trap_alloc(true);
        a.emplace(1u32);
        a.emplace(2u32); // over capacity
    }

    #[test]
    fn reserve_then_trap_is_quiet() {
        let mut a = Arena::new();
        a.reserve(64);
        a.set_trap_alloc(true);
        for i in 0..16u32 {
            a.emplace(i);
        }
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn clone_preserves_embedded_arrays_byte_for_byte() {
        let mut a = Arena::new();
        let arr: FlatArray<u16, u16, u16> = FlatArray::emplace(&mut a);
        for i in 0..300u16 {
            arr.push(&mut a, i);
        }
        let b = a.clone();
        assert_eq!(a.bytes(), b.bytes());
        let view: FlatArray<u16, u16, u16> = FlatArray::at(arr.head());
        assert_eq!(view.len(&b), 300);
        assert_eq!(view.get(&b, 299), 299);
    }
}

// ── PlanRng ───────────────────────────────────────────────────────────────────

mod rng {
    use crate::PlanRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = PlanRng::new(7);
        let mut b = PlanRng::new(7);
        for _ in 0..32 {
            assert_eq!(a.gen_range(0..1_000_000u32), b.gen_range(0..1_000_000u32));
        }
    }

    #[test]
    fn choose_covers_slice() {
        let mut rng = PlanRng::new(1);
        let opts = [10, 20, 30];
        for _ in 0..10 {
            let v = *rng.choose(&opts).unwrap();
            assert!(opts.contains(&v));
        }
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}
