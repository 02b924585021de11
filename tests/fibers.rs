// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::anyhow::Result;
use ::catfiber::{
    futures::{
        await_all,
        capture_all,
        do_async,
        wait_on,
        CallbackFuture,
    },
    FiberId,
    SharedRuntime,
};
use ::std::{
    cell::{
        Cell,
        RefCell,
    },
    collections::HashSet,
    future::Future,
    pin::Pin,
    rc::Rc,
    time::Duration,
};

//==============================================================================
// Scheduling
//==============================================================================

/// Two fibers that never suspend run whole, in spawn order.
#[test]
fn fifo_fairness() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let log_a: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("a", async move {
        log_a.borrow_mut().push("A");
    });
    let log_b: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("b", async move {
        log_b.borrow_mut().push("B");
    });

    runtime.run();
    let order: Vec<&'static str> = log.borrow().clone();
    catfiber::ensure_eq!(order, vec!["A", "B"]);
    Ok(())
}

/// A spawn issued from inside a fiber lands behind everything already queued.
#[test]
fn nested_spawn_appends_to_the_tail() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let mut runtime_a: SharedRuntime = runtime.clone();
    let log_a: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("a", async move {
        let log_c: Rc<RefCell<Vec<&'static str>>> = log_a.clone();
        runtime_a.spawn("c", async move {
            log_c.borrow_mut().push("C");
        });
        log_a.borrow_mut().push("A");
    });
    let log_b: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("b", async move {
        log_b.borrow_mut().push("B");
    });

    runtime.run();
    let order: Vec<&'static str> = log.borrow().clone();
    catfiber::ensure_eq!(order, vec!["A", "B", "C"]);
    Ok(())
}

/// A fiber that yields is resumed only after every fiber already queued.
#[test]
fn yield_now_round_robins() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let runtime_a: SharedRuntime = runtime.clone();
    let log_a: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("a", async move {
        log_a.borrow_mut().push("A1");
        runtime_a.yield_now().await;
        log_a.borrow_mut().push("A2");
    });
    let log_b: Rc<RefCell<Vec<&'static str>>> = log.clone();
    runtime.spawn("b", async move {
        log_b.borrow_mut().push("B");
    });

    runtime.run();
    let order: Vec<&'static str> = log.borrow().clone();
    catfiber::ensure_eq!(order, vec!["A1", "B", "A2"]);
    Ok(())
}

/// Sequentially spawned short fibers share one recycled envelope: the fiber
/// identifiers repeat instead of growing.
#[test]
fn short_fibers_recycle_envelopes() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let ids: Rc<RefCell<Vec<FiberId>>> = Rc::new(RefCell::new(Vec::new()));

    let mut runtime_d: SharedRuntime = runtime.clone();
    let ids_d: Rc<RefCell<Vec<FiberId>>> = ids.clone();
    runtime.spawn("driver", async move {
        for _ in 0..10 {
            let id: FiberId = runtime_d.spawn("short", async {});
            ids_d.borrow_mut().push(id);
            // Let the short fiber run and terminate before the next spawn.
            runtime_d.yield_now().await;
        }
    });

    runtime.run();

    let ids: Vec<FiberId> = ids.borrow().clone();
    catfiber::ensure_eq!(ids.len(), 10);
    let distinct: HashSet<FiberId> = ids.iter().copied().collect();
    catfiber::ensure_eq!(distinct.len() <= 2, true);
    Ok(())
}

//==============================================================================
// Combinators and callback futures
//==============================================================================

/// capture_all visits its awaitables in order and collects results in that
/// order.
#[test]
fn capture_all_preserves_order() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let visits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let results: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));

    let runtime_2: SharedRuntime = runtime.clone();
    let visits_2: Rc<RefCell<Vec<&'static str>>> = visits.clone();
    let results_2: Rc<RefCell<Vec<i32>>> = results.clone();
    runtime.spawn("combining", async move {
        let visits_x: Rc<RefCell<Vec<&'static str>>> = visits_2.clone();
        let visits_y: Rc<RefCell<Vec<&'static str>>> = visits_2.clone();
        let awaitables: Vec<Pin<Box<dyn Future<Output = i32>>>> = vec![
            Box::pin(wait_on(
                runtime_2.clone(),
                do_async(move || {
                    visits_x.borrow_mut().push("x");
                    1
                }),
            )),
            Box::pin(wait_on(
                runtime_2.clone(),
                do_async(move || {
                    visits_y.borrow_mut().push("y");
                    2
                }),
            )),
        ];
        *results_2.borrow_mut() = capture_all(awaitables).await;
    });

    runtime.run();
    catfiber::ensure_eq!(visits.borrow().clone(), vec!["x", "y"]);
    catfiber::ensure_eq!(results.borrow().clone(), vec![1, 2]);
    Ok(())
}

/// await_all visits its awaitables in order and discards results.
#[test]
fn await_all_visits_in_order() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let visits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let runtime_2: SharedRuntime = runtime.clone();
    let visits_2: Rc<RefCell<Vec<&'static str>>> = visits.clone();
    runtime.spawn("combining", async move {
        let visits_x: Rc<RefCell<Vec<&'static str>>> = visits_2.clone();
        let visits_y: Rc<RefCell<Vec<&'static str>>> = visits_2.clone();
        let awaitables: Vec<Pin<Box<dyn Future<Output = ()>>>> = vec![
            Box::pin(wait_on(runtime_2.clone(), do_async(move || visits_x.borrow_mut().push("x")))),
            Box::pin(wait_on(runtime_2.clone(), do_async(move || visits_y.borrow_mut().push("y")))),
        ];
        await_all(awaitables).await;
    });

    runtime.run();
    catfiber::ensure_eq!(visits.borrow().clone(), vec!["x", "y"]);
    Ok(())
}

/// A polling-style callback future completes once another fiber flips its
/// readiness.
#[test]
fn callback_future_wakes_on_cross_fiber_progress() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let slot: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let observed: Rc<Cell<i32>> = Rc::new(Cell::new(0));

    let runtime_p: SharedRuntime = runtime.clone();
    let slot_p: Rc<Cell<Option<i32>>> = slot.clone();
    let observed_p: Rc<Cell<i32>> = observed.clone();
    runtime.spawn("poller", async move {
        let slot_cb: Rc<Cell<Option<i32>>> = slot_p.clone();
        let value: i32 = wait_on(runtime_p.clone(), CallbackFuture::new(move || slot_cb.get())).await;
        observed_p.set(value);
    });

    let runtime_s: SharedRuntime = runtime.clone();
    let slot_s: Rc<Cell<Option<i32>>> = slot.clone();
    runtime.spawn("setter", async move {
        runtime_s.sleep(Duration::from_millis(20)).await.expect("sleep failed");
        slot_s.set(Some(7));
    });

    runtime.run();
    catfiber::ensure_eq!(observed.get(), 7);
    Ok(())
}
