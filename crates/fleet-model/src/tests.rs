//! Unit tests for fleet-model.

use fleet_core::{AgentId, JobId, NameId, Pos};

use crate::action::ActionKind;
use crate::facility::{Shop, ShopItem, Storage, Workshop};
use crate::items::ItemStack;
use crate::job::{Job, JobKind, Mission};
use crate::percept::{Percept, SelfPercept};
use crate::situation::Situation;
use crate::task::{Strategy, Task, TaskKind};

// ── Fixtures ──────────────────────────────────────────────────────────────────

const ITEM9: NameId = NameId(9);
const SHOP1: NameId = NameId(20);
const STORAGE4: NameId = NameId(21);
const WORKSHOP: NameId = NameId(22);
const JOB_A: JobId = JobId(100);
const JOB_B: JobId = JobId(101);

fn job(id: JobId, reward: u16) -> Job {
    Job {
        id,
        storage: STORAGE4,
        start: 0,
        end: 50,
        reward,
        required: vec![ItemStack::new(ITEM9, 1)],
    }
}

fn percept(step: u16) -> Percept {
    Percept {
        id: step,
        deadline_ms: 0,
        simulation_step: step,
        team_money: 100,
        this_agent: SelfPercept::default(),
        entities: vec![],
        charging_stations: vec![],
        dumps: vec![],
        shops: vec![Shop {
            id: SHOP1,
            pos: Pos::new(100, 100),
            restock: 5,
            items: vec![ShopItem { item: ITEM9, amount: 10, cost: 50, restock: 5 }],
        }],
        storages: vec![Storage {
            id: STORAGE4,
            pos: Pos::new(200, 200),
            price: 0,
            total_cap: 100,
            used_cap: 0,
            items: vec![],
        }],
        workshops: vec![Workshop { id: WORKSHOP, pos: Pos::new(300, 300), price: 0 }],
        resource_nodes: vec![],
        auctions: vec![],
        jobs: vec![job(JOB_A, 400)],
        missions: vec![Mission { job: job(JOB_B, 200), fine: 50 }],
        posteds: vec![],
    }
}

// ── Strategy queues ───────────────────────────────────────────────────────────

mod strategy {
    use super::*;
    use fleet_core::TASKS_MAX;

    fn buy_task(id: u16) -> Task {
        Task {
            kind: TaskKind::BuyItem,
            where_: SHOP1,
            item: ItemStack::new(ITEM9, 1),
            id,
            ..Task::default()
        }
    }

    #[test]
    fn insert_shifts_right_and_drops_the_tail() {
        let mut s = Strategy::new();
        let a = AgentId(0);
        for i in 0..TASKS_MAX {
            s.insert_task(a, i, buy_task(i as u16 + 1));
        }
        // Insert at the front: everything moves, last task falls off.
        s.insert_task(a, 0, buy_task(99));
        assert_eq!(s.task(a, 0).task.id, 99);
        assert_eq!(s.task(a, 1).task.id, 1);
        assert_eq!(s.task(a, TASKS_MAX - 1).task.id, TASKS_MAX as u16 - 1);
    }

    #[test]
    fn remove_shifts_left_and_clears_the_tail() {
        let mut s = Strategy::new();
        let a = AgentId(2);
        s.insert_task(a, 0, buy_task(1));
        s.insert_task(a, 1, buy_task(2));
        s.remove_task(a, 0);
        assert_eq!(s.task(a, 0).task.id, 2);
        assert!(s.task(a, 1).task.is_none());
        assert!(s.task(a, TASKS_MAX - 1).task.is_none());
    }

    #[test]
    fn push_finds_the_first_free_slot() {
        let mut s = Strategy::new();
        let a = AgentId(1);
        assert_eq!(s.push_task(a, 0, buy_task(1)), Some(0));
        assert_eq!(s.push_task(a, 0, buy_task(2)), Some(1));
        assert_eq!(s.queued(a), 2);
    }

    #[test]
    fn push_full_queue_returns_none() {
        let mut s = Strategy::new();
        let a = AgentId(0);
        for i in 0..TASKS_MAX {
            assert!(s.push_task(a, 0, buy_task(i as u16 + 1)).is_some());
        }
        assert_eq!(s.push_task(a, 0, buy_task(99)), None);
    }

    #[test]
    fn fresh_ids_are_unique_and_nonzero() {
        let mut s = Strategy::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let id = s.fresh_id();
            assert_ne!(id, 0);
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn job_claimed_sees_delivery_tasks() {
        let mut s = Strategy::new();
        assert!(!s.job_claimed(JOB_A));
        s.insert_task(
            AgentId(3),
            0,
            Task {
                kind: TaskKind::DeliverItem,
                where_: STORAGE4,
                job: JOB_A,
                item: ItemStack::new(ITEM9, 1),
                id: 1,
                ..Task::default()
            },
        );
        assert!(s.job_claimed(JOB_A));
        assert!(!s.job_claimed(JOB_B));
    }
}

// ── Situation construction ────────────────────────────────────────────────────

mod situation {
    use super::*;
    use crate::situation::DeliveredItem;

    #[test]
    fn builds_from_percept() {
        let sit = Situation::from_percept(&percept(3), None);
        assert_eq!(sit.simulation_step, 3);
        assert_eq!(sit.team_money, 100);
        assert_eq!(sit.shops.len(), 1);
        assert_eq!(sit.find_pos(SHOP1), Some(Pos::new(100, 100)));
        assert_eq!(sit.find_pos(NameId(99)), None);
    }

    #[test]
    fn update_fills_one_self_block() {
        let mut sit = Situation::from_percept(&percept(0), None);
        let mut p = percept(0);
        p.this_agent = SelfPercept {
            pos: Pos::new(5, 6),
            charge: 77,
            load: 3,
            facility: SHOP1,
            action_kind: ActionKind::Buy,
            items: vec![ItemStack::new(ITEM9, 2)],
            ..SelfPercept::default()
        };
        sit.update(&p, AgentId(4));
        let d = sit.agent(AgentId(4));
        assert_eq!(d.charge, 77);
        assert_eq!(d.facility, SHOP1);
        assert_eq!(d.items, vec![ItemStack::new(ITEM9, 2)]);
        // Other agents untouched.
        assert_eq!(sit.agent(AgentId(0)).charge, 0);
    }

    #[test]
    fn book_rows_for_vanished_jobs_are_purged() {
        let mut old = Situation::from_percept(&percept(0), None);
        old.book.delivered.push(DeliveredItem { job: JOB_A, item: ItemStack::new(ITEM9, 1) });
        old.book.delivered.push(DeliveredItem { job: JobId(999), item: ItemStack::new(ITEM9, 1) });

        let sit = Situation::from_percept(&percept(1), Some(&old));
        assert_eq!(sit.book.delivered.len(), 1);
        assert_eq!(sit.book.delivered[0].job, JOB_A);
    }

    #[test]
    fn strategy_and_task_progress_carry_forward() {
        let mut old = Situation::from_percept(&percept(0), None);
        old.strategy.insert_task(
            AgentId(1),
            0,
            Task { kind: TaskKind::Visit, where_: WORKSHOP, id: 7, ..Task::default() },
        );
        old.selves[1].task_state = 1;
        old.selves[1].last_go = WORKSHOP;

        let sit = Situation::from_percept(&percept(1), Some(&old));
        assert_eq!(sit.strategy.task(AgentId(1), 0).task.id, 7);
        assert_eq!(sit.agent(AgentId(1)).task_state, 1);
        assert_eq!(sit.agent(AgentId(1)).last_go, WORKSHOP);
    }

    #[test]
    fn job_lookup_priority_and_removal() {
        let mut sit = Situation::from_percept(&percept(0), None);
        assert_eq!(sit.find_job(JOB_A).map(|(k, _)| k), Some(JobKind::Priced));
        assert_eq!(sit.find_job(JOB_B).map(|(k, _)| k), Some(JobKind::Mission));
        assert_eq!(sit.remove_job(JOB_B), Some(200));
        assert!(sit.find_job(JOB_B).is_none());
        assert_eq!(sit.remove_job(JOB_B), None);
    }
}

// ── Diff journal ──────────────────────────────────────────────────────────────

mod diff {
    use super::*;
    use crate::diff::{DiffQueue, SitEdit};

    #[test]
    fn agent_item_edits_merge_into_existing_stacks() {
        let mut sit = Situation::from_percept(&percept(0), None);
        sit.selves[0].items.push(ItemStack::new(ITEM9, 2));

        let mut q = DiffQueue::new();
        q.add(SitEdit::AddAgentItem { agent: AgentId(0), item: ItemStack::new(ITEM9, 3) });
        q.add(SitEdit::AddAgentItem { agent: AgentId(0), item: ItemStack::new(NameId(5), 1) });
        q.apply(&mut sit);

        assert_eq!(sit.selves[0].items.len(), 2);
        assert_eq!(sit.selves[0].items[0], ItemStack::new(ITEM9, 5));
        assert!(q.is_empty());
    }

    #[test]
    fn delivered_rows_merge_and_purge() {
        let mut sit = Situation::from_percept(&percept(0), None);
        let mut q = DiffQueue::new();
        q.add(SitEdit::AddDelivered { job: JOB_A, item: ItemStack::new(ITEM9, 1) });
        q.add(SitEdit::AddDelivered { job: JOB_A, item: ItemStack::new(ITEM9, 2) });
        q.apply(&mut sit);
        assert_eq!(sit.book.delivered_amount(JOB_A, ITEM9), 3);

        q.add(SitEdit::RemoveDeliveredFor { job: JOB_A });
        q.add(SitEdit::RemoveJob { job: JOB_A });
        q.apply(&mut sit);
        assert_eq!(sit.book.delivered_amount(JOB_A, ITEM9), 0);
        assert!(sit.find_job(JOB_A).is_none());
    }
}
