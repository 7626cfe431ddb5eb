//! Scenario tests for the forward simulator.
//!
//! The fixture city is four facilities on a ring; distances work out to a
//! few travel steps between neighbours, so roll-outs stay short and every
//! expectation can be stated exactly.

use std::sync::Arc;

use fleet_core::{AgentId, JobId, MapBounds, NameId, Pos};
use fleet_graph::GraphBuilder;
use fleet_model::situation::SLEEP_MAX;
use fleet_model::{
    ChargingStation, Item, ItemStack, Job, Percept, Role, SelfPercept, Shop, ShopItem, Situation,
    Storage, Task, TaskErr, TaskKind, Workshop, World,
};

use crate::params::SimParams;
use crate::sim::SimState;

// ── Names ─────────────────────────────────────────────────────────────────────

const ITEM9: NameId = NameId(9);
const ITEM_B: NameId = NameId(8);
const ITEM_A: NameId = NameId(7);
const TOOL1: NameId = NameId(15);

const SHOP1: NameId = NameId(20);
const STORAGE4: NameId = NameId(21);
const WORKSHOP1: NameId = NameId(22);
const STATION1: NameId = NameId(23);

const JOB_J: JobId = JobId(100);

// ── Fixture ───────────────────────────────────────────────────────────────────

fn bounds() -> MapBounds {
    MapBounds::new(51.4625, 51.5475, -0.1978, -0.0354)
}

fn cell(a: u16, b: u16) -> Pos {
    Pos::new(10_000 + a * 5_000, 10_000 + b * 5_000)
}

/// Facility lattice positions.  Neighbours on the ring are 2–3 travel units
/// apart at speed 2, i.e. one or two steps.
fn shop_pos() -> Pos {
    cell(0, 0)
}
fn storage_pos() -> Pos {
    cell(0, 2)
}
fn workshop_pos() -> Pos {
    cell(2, 0)
}
fn station_pos() -> Pos {
    cell(2, 2)
}

fn build_world() -> World {
    let b = bounds();
    let mut gb = GraphBuilder::new("simcity", b.clone());
    let n_shop = gb.add_node(shop_pos());
    let n_storage = gb.add_node(storage_pos());
    let n_workshop = gb.add_node(workshop_pos());
    let n_station = gb.add_node(station_pos());
    for (x, y) in [
        (n_shop, n_storage),
        (n_storage, n_station),
        (n_station, n_workshop),
        (n_workshop, n_shop),
        (n_shop, n_station),
    ] {
        let d = (b.dist_air(gb.node_pos(x), gb.node_pos(y)) * 1_100.0) as u32;
        gb.add_road(x, y, d);
    }
    let graph = Arc::new(gb.build());

    let items = vec![
        Item { id: ITEM9, volume: 10, assembled: false, consumed: vec![], tools: vec![] },
        Item { id: ITEM_B, volume: 10, assembled: false, consumed: vec![], tools: vec![] },
        Item { id: TOOL1, volume: 20, assembled: false, consumed: vec![], tools: vec![] },
        Item {
            id: ITEM_A,
            volume: 30,
            assembled: true,
            consumed: vec![ItemStack::new(ITEM_B, 2)],
            tools: vec![TOOL1],
        },
    ];

    let mut roles = vec![
        Role { id: NameId(30), speed: 2, battery: 250, load: 300, tools: vec![] };
        fleet_core::AGENTS
    ];
    // Agent 2 is the tool carrier.
    roles[2].tools = vec![TOOL1];

    World {
        team: NameId(1),
        seed_capital: 100,
        steps: 1000,
        items,
        roles,
        agents: (0..fleet_core::AGENTS).map(|i| NameId(40 + i as u8)).collect(),
        graph,
    }
}

fn base_percept(step: u16, money: u32) -> Percept {
    Percept {
        id: step,
        deadline_ms: 0,
        simulation_step: step,
        team_money: money,
        this_agent: SelfPercept::default(),
        entities: vec![],
        charging_stations: vec![ChargingStation {
            id: STATION1,
            pos: station_pos(),
            rate: 5,
            price: 0,
            slots: 4,
            q_size: 0,
        }],
        dumps: vec![],
        shops: vec![Shop {
            id: SHOP1,
            pos: shop_pos(),
            restock: 5,
            items: vec![ShopItem { item: ITEM9, amount: 10, cost: 50, restock: 5 }],
        }],
        storages: vec![Storage {
            id: STORAGE4,
            pos: storage_pos(),
            price: 0,
            total_cap: 10_000,
            used_cap: 0,
            items: vec![],
        }],
        workshops: vec![Workshop { id: WORKSHOP1, pos: workshop_pos(), price: 0 }],
        resource_nodes: vec![],
        auctions: vec![],
        jobs: vec![Job {
            id: JOB_J,
            storage: STORAGE4,
            start: 0,
            end: 200,
            reward: 400,
            required: vec![ItemStack::new(ITEM9, 1)],
        }],
        missions: vec![],
        posteds: vec![],
    }
}

fn base_situation(money: u32) -> Situation {
    let mut sit = Situation::from_percept(&base_percept(0, money), None);
    for d in sit.selves.iter_mut() {
        d.pos = station_pos();
        d.facility = STATION1;
        d.charge = 250;
    }
    sit
}

fn place(sit: &mut Situation, agent: u8, pos: Pos, facility: NameId) {
    let d = &mut sit.selves[agent as usize];
    d.pos = pos;
    d.facility = facility;
}

fn task(kind: TaskKind, where_: NameId) -> Task {
    Task { kind, where_, ..Task::default() }
}

fn ff(sit: &Situation, world: &World, steps: u16) -> SimState {
    let mut sim = SimState::new(sit, SimParams::default());
    sim.fast_forward(world, steps).unwrap();
    sim
}

// ── Buy → deliver ─────────────────────────────────────────────────────────────

mod buy_deliver {
    use super::*;

    #[test]
    fn completes_the_job_and_credits_the_reward() {
        let world = build_world();
        let mut sit = base_situation(100);
        let a0 = AgentId(0);
        sit.strategy.insert_task(
            a0,
            0,
            Task {
                kind: TaskKind::BuyItem,
                where_: SHOP1,
                item: ItemStack::new(ITEM9, 1),
                id: 1,
                ..Task::default()
            },
        );
        sit.strategy.insert_task(
            a0,
            1,
            Task {
                kind: TaskKind::DeliverItem,
                where_: STORAGE4,
                job: JOB_J,
                item: ItemStack::new(ITEM9, 1),
                id: 2,
                ..Task::default()
            },
        );

        let sim = ff(&sit, &world, 40);

        // 100 seed − 50 purchase + 400 reward.
        assert_eq!(sim.sit().team_money, 450);
        assert!(sim.sit().find_job(JOB_J).is_none());
        assert!(sim.sit().book.delivered.is_empty());
        assert_eq!(sim.sit().strategy.task(a0, 0).result.err, TaskErr::Success);
        assert_eq!(sim.sit().strategy.task(a0, 1).result.err, TaskErr::Success);
        // The delivered item left the inventory.
        let carried = fleet_model::find_stack(&sim.sit().agent(a0).items, ITEM9)
            .map(|s| s.amount)
            .unwrap_or(0);
        assert_eq!(carried, 0);
        // Shop stock went down by one.
        assert_eq!(sim.sit().shops[0].items[0].amount, 9);
    }

    #[test]
    fn empty_shop_stalls_for_the_restock_period() {
        let world = build_world();
        let mut sit = base_situation(500);
        sit.shops[0].items[0].amount = 0;
        place(&mut sit, 0, shop_pos(), SHOP1);
        sit.strategy.insert_task(
            AgentId(0),
            0,
            Task {
                kind: TaskKind::BuyItem,
                where_: SHOP1,
                item: ItemStack::new(ITEM9, 2),
                id: 1,
                ..Task::default()
            },
        );

        let sim = ff(&sit, &world, 40);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::Success);
        // restock(5) × amount(2) steps of waiting, starting at the shop.
        assert_eq!(slot.result.time, 10);
        // Money is already committed.
        assert_eq!(sim.sit().team_money, 500 - 100);
    }

    #[test]
    fn missing_delivery_item_reports_not_in_inventory() {
        let world = build_world();
        let mut sit = base_situation(100);
        sit.strategy.insert_task(
            AgentId(0),
            0,
            Task {
                kind: TaskKind::DeliverItem,
                where_: STORAGE4,
                job: JOB_J,
                item: ItemStack::new(ITEM9, 1),
                id: 1,
                ..Task::default()
            },
        );

        let sim = ff(&sit, &world, 40);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::NotInInventory);
        assert_eq!(slot.result.err_arg, ItemStack::new(ITEM9, 1));
        // The job is untouched.
        assert!(sim.sit().find_job(JOB_J).is_some());
    }
}

// ── Crafting ──────────────────────────────────────────────────────────────────

mod craft {
    use super::*;

    fn queue_craft(sit: &mut Situation, with_assist: bool) {
        let a0 = AgentId(0);
        place(sit, 0, workshop_pos(), WORKSHOP1);
        sit.selves[0].items = vec![ItemStack::new(ITEM_B, 2)];
        sit.strategy.insert_task(
            a0,
            0,
            Task {
                kind: TaskKind::CraftItem,
                where_: WORKSHOP1,
                item: ItemStack::new(ITEM_A, 1),
                id: 1,
                ..Task::default()
            },
        );
        if with_assist {
            place(sit, 2, workshop_pos(), WORKSHOP1);
            sit.selves[2].items = vec![ItemStack::new(TOOL1, 1)];
            sit.strategy.insert_task(
                AgentId(2),
                0,
                Task {
                    kind: TaskKind::CraftAssist,
                    where_: WORKSHOP1,
                    crafter: a0,
                    item: ItemStack::new(ITEM_A, 1),
                    id: 2,
                    ..Task::default()
                },
            );
        }
    }

    #[test]
    fn assisted_craft_consumes_inputs_and_yields_the_product() {
        let world = build_world();
        let mut sit = base_situation(100);
        queue_craft(&mut sit, true);

        let sim = ff(&sit, &world, 30);
        let a0 = AgentId(0);
        assert_eq!(sim.sit().strategy.task(a0, 0).result.err, TaskErr::Success);
        assert_eq!(sim.sit().strategy.task(AgentId(2), 0).result.err, TaskErr::Success);

        let inv = &sim.sit().agent(a0).items;
        assert_eq!(fleet_model::find_stack(inv, ITEM_A).unwrap().amount, 1);
        assert_eq!(fleet_model::find_stack(inv, ITEM_B).unwrap().amount, 0);
        // The tool is not consumed.
        let assist_inv = &sim.sit().agent(AgentId(2)).items;
        assert_eq!(fleet_model::find_stack(assist_inv, TOOL1).unwrap().amount, 1);
    }

    #[test]
    fn craft_preserves_total_inventory_minus_recipe() {
        let world = build_world();
        let mut sit = base_situation(100);
        queue_craft(&mut sit, true);

        let count_all = |sit: &Situation, id: NameId| -> i32 {
            sit.selves
                .iter()
                .filter_map(|d| fleet_model::find_stack(&d.items, id))
                .map(|s| s.amount as i32)
                .sum()
        };
        let b_before = count_all(&sit, ITEM_B);
        let a_before = count_all(&sit, ITEM_A);

        let sim = ff(&sit, &world, 30);
        assert_eq!(count_all(sim.sit(), ITEM_B), b_before - 2);
        assert_eq!(count_all(sim.sit(), ITEM_A), a_before + 1);
    }

    #[test]
    fn missing_tool_fails_after_the_wait() {
        let world = build_world();
        let mut sit = base_situation(100);
        queue_craft(&mut sit, false);

        let sim = ff(&sit, &world, 40);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::CraftNoTool);
        assert_eq!(slot.result.err_arg, ItemStack::new(TOOL1, 1));
        // The crafter is parked, not spinning.
        assert_eq!(sim.sit().agent(AgentId(0)).task_sleep, SLEEP_MAX);
    }

    #[test]
    fn missing_inputs_fail_with_the_missing_count() {
        let world = build_world();
        let mut sit = base_situation(100);
        queue_craft(&mut sit, true);
        // Take away one of the two required inputs.
        sit.selves[0].items = vec![ItemStack::new(ITEM_B, 1)];

        let sim = ff(&sit, &world, 40);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::CraftNoItem);
        assert_eq!(slot.result.err_arg, ItemStack::new(ITEM_B, 1));
    }

    #[test]
    fn orphan_assist_reports_no_crafter() {
        let world = build_world();
        let mut sit = base_situation(100);
        place(&mut sit, 2, workshop_pos(), WORKSHOP1);
        sit.strategy.insert_task(
            AgentId(2),
            0,
            Task {
                kind: TaskKind::CraftAssist,
                where_: WORKSHOP1,
                crafter: AgentId(0), // agent 0 has no craft queued
                item: ItemStack::new(ITEM_A, 1),
                id: 1,
                ..Task::default()
            },
        );

        let sim = ff(&sit, &world, 20);
        assert_eq!(
            sim.sit().strategy.task(AgentId(2), 0).result.err,
            TaskErr::NoCrafterFound
        );
    }
}

// ── Battery & charging ────────────────────────────────────────────────────────

mod battery {
    use super::*;

    #[test]
    fn travel_beyond_charge_fails_out_of_battery() {
        let world = build_world();
        let mut sit = base_situation(100);
        place(&mut sit, 0, station_pos(), STATION1);
        sit.selves[0].charge = 10; // threshold: (10/10)·2 = 2 travel units
        sit.strategy
            .insert_task(AgentId(0), 0, task(TaskKind::Visit, SHOP1));

        let sim = ff(&sit, &world, 20);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::OutOfBattery);
        assert_eq!(sim.sit().agent(AgentId(0)).task_sleep, SLEEP_MAX);
        // Charge untouched by the refused leg.
        assert_eq!(sim.sit().agent(AgentId(0)).charge, 10);
    }

    #[test]
    fn travel_pays_ten_charge_per_step() {
        let world = build_world();
        let mut sit = base_situation(100);
        place(&mut sit, 0, station_pos(), STATION1);
        sit.strategy
            .insert_task(AgentId(0), 0, task(TaskKind::Visit, STORAGE4));

        let sim = ff(&sit, &world, 20);
        assert_eq!(sim.sit().strategy.task(AgentId(0), 0).result.err, TaskErr::Success);
        let d = sim.sit().agent(AgentId(0));
        let steps_paid = (250 - d.charge) / 10;
        assert!(steps_paid >= 1, "travel must cost charge");
        assert_eq!(d.facility, STORAGE4);
    }

    #[test]
    fn charging_fills_the_battery_at_the_station_rate() {
        let world = build_world();
        let mut sit = base_situation(100);
        place(&mut sit, 0, station_pos(), STATION1);
        sit.selves[0].charge = 50;
        sit.strategy
            .insert_task(AgentId(0), 0, task(TaskKind::Charge, STATION1));

        let sim = ff(&sit, &world, 60);
        let slot = sim.sit().strategy.task(AgentId(0), 0);
        assert_eq!(slot.result.err, TaskErr::Success);
        // (250 − 50) / rate 5 = 40 steps on the plug.
        assert_eq!(slot.result.time, 40);
        assert_eq!(sim.sit().agent(AgentId(0)).charge, 250);
    }
}

// ── Job expiry ────────────────────────────────────────────────────────────────

mod expiry {
    use super::*;
    use fleet_model::situation::DeliveredItem;

    #[test]
    fn job_vanishes_mid_plan_and_delivery_fails() {
        let world = build_world();
        let mut sit = base_situation(100);
        sit.jobs[0].end = 1; // expires before the agent can arrive
        sit.book.delivered.push(DeliveredItem { job: JOB_J, item: ItemStack::new(ITEM9, 1) });
        place(&mut sit, 0, station_pos(), STATION1);
        sit.selves[0].items = vec![ItemStack::new(ITEM9, 1)];
        sit.strategy.insert_task(
            AgentId(0),
            0,
            Task {
                kind: TaskKind::DeliverItem,
                where_: STORAGE4,
                job: JOB_J,
                item: ItemStack::new(ITEM9, 1),
                id: 1,
                ..Task::default()
            },
        );

        let sim = ff(&sit, &world, 30);
        assert!(sim.sit().find_job(JOB_J).is_none());
        assert!(sim.sit().book.delivered.is_empty());
        assert_eq!(
            sim.sit().strategy.task(AgentId(0), 0).result.err,
            TaskErr::NoSuchJob
        );
    }
}

// ── Determinism & clock ───────────────────────────────────────────────────────

mod determinism {
    use super::*;

    #[test]
    fn identical_inputs_roll_out_identically() {
        let world = build_world();
        let mut sit = base_situation(100);
        sit.strategy.insert_task(
            AgentId(0),
            0,
            Task {
                kind: TaskKind::BuyItem,
                where_: SHOP1,
                item: ItemStack::new(ITEM9, 2),
                id: 1,
                ..Task::default()
            },
        );
        sit.strategy
            .insert_task(AgentId(1), 0, task(TaskKind::Visit, WORKSHOP1));

        let a = ff(&sit, &world, 50);
        let b = ff(&sit, &world, 50);

        assert_eq!(a.sit().team_money, b.sit().team_money);
        assert_eq!(a.sit().simulation_step, b.sit().simulation_step);
        for i in 0..fleet_core::AGENTS {
            let (da, db) = (&a.sit().selves[i], &b.sit().selves[i]);
            assert_eq!(da.charge, db.charge);
            assert_eq!(da.items, db.items);
            assert_eq!(da.task_index, db.task_index);
            for t in 0..fleet_core::TASKS_MAX {
                let agent = AgentId(i as u8);
                assert_eq!(
                    a.sit().strategy.task(agent, t).result,
                    b.sit().strategy.task(agent, t).result
                );
            }
        }
    }

    #[test]
    fn clock_reaches_the_horizon_exactly() {
        let world = build_world();
        let sit = base_situation(100); // nobody has tasks
        let sim = ff(&sit, &world, 321);
        assert_eq!(sim.sit().simulation_step, 321);
    }

    #[test]
    fn reset_discards_simulated_progress() {
        let world = build_world();
        let mut sit = base_situation(100);
        sit.strategy.insert_task(
            AgentId(0),
            0,
            Task {
                kind: TaskKind::BuyItem,
                where_: SHOP1,
                item: ItemStack::new(ITEM9, 1),
                id: 1,
                ..Task::default()
            },
        );
        let mut sim = SimState::new(&sit, SimParams::default());
        sim.fast_forward(&world, 40).unwrap();
        assert_ne!(sim.sit().team_money, 100);
        sim.reset(&sit);
        assert_eq!(sim.sit().team_money, 100);
        assert_eq!(sim.sit().simulation_step, 0);
    }
}
