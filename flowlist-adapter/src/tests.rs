use crate::*;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use alloc::{format, vec};
use std::sync::Mutex;

use flowlist::{IntersectionEntry, ListOptions, SignalSource, VirtualList};

type Item = Option<String>;

fn asset_items(n: usize) -> Vec<Item> {
    (0..n).map(|i| Some(format!("img-{i}.png"))).collect()
}

fn url_options() -> ControllerOptions<Item> {
    ControllerOptions::new().with_asset_url(|item: &Item, _| item.clone())
}

fn controller(items: Vec<Item>, list: ListOptions) -> Controller<Item, LoadQueue> {
    Controller::new(
        items,
        list,
        url_options(),
        LoadQueue::new(),
        TimerIdleScheduler::default(),
        0,
    )
}

#[derive(Debug, Default)]
struct FakeIdleHost {
    next_id: u64,
    requested: Vec<(u64, u64)>,
    cancelled: Vec<u64>,
}

impl IdleHost for FakeIdleHost {
    fn request_idle_callback(&mut self, timeout_ms: u64) -> u64 {
        self.next_id += 1;
        self.requested.push((self.next_id, timeout_ms));
        self.next_id
    }

    fn cancel_idle_callback(&mut self, id: u64) {
        self.cancelled.push(id);
    }
}

fn fake_host(s: &AnyIdleScheduler<FakeIdleHost>) -> &FakeIdleHost {
    match s {
        AnyIdleScheduler::Native(s) => s.host(),
        AnyIdleScheduler::Polyfill(_) => panic!("expected the native scheduler"),
    }
}

#[test]
fn resolver_loads_each_asset_at_most_once() {
    let mut list = VirtualList::new(ListOptions::new(3, 50u32));
    let mut loader = LoadQueue::new();
    let mut r = HeightResolver::new(3);

    let Some(Resolution::Pending(ticket)) =
        r.resolve(&mut list, &mut loader, 1, || Some(String::from("a.png")))
    else {
        panic!("expected a pending load");
    };
    assert_eq!(ticket.index, 1);

    let mut calls = 0;
    let again = r.resolve(&mut list, &mut loader, 1, || {
        calls += 1;
        Some(String::from("a.png"))
    });
    assert_eq!(again, Some(Resolution::Pending(ticket)));
    assert_eq!(calls, 0);
    assert_eq!(loader.issued(), 1);
    assert_eq!(r.in_flight(), 1);

    let outcome = r.complete(&mut list, ticket, Ok(AssetDimensions::new(768, 300)));
    assert_eq!(
        outcome,
        LoadOutcome::Measured {
            index: 1,
            height: 350
        }
    );
    assert!(r.complete(&mut list, ticket, Ok(AssetDimensions::new(1, 1))).is_stale());
    assert_eq!(list.cache().height(1), Some(350));

    let ready = r.resolve(&mut list, &mut loader, 1, || {
        calls += 1;
        None
    });
    assert_eq!(ready, Some(Resolution::Ready(350)));
    assert_eq!(calls, 0);
    assert_eq!(loader.issued(), 1);
    assert_eq!(list.resolved_count(), 1);

    // Items without an asset resolve on the spot.
    assert_eq!(
        r.resolve(&mut list, &mut loader, 0, || None),
        Some(Resolution::Ready(50))
    );
    assert_eq!(r.resolve(&mut list, &mut loader, 3, || None), None);
}

#[test]
fn fixed_heights_without_assets_complete_immediately() {
    let mut c = controller(
        vec![None; 100],
        ListOptions::new(0, 200u32)
            .with_container_height(400)
            .with_overscan(2),
    );

    assert_eq!(c.preload_progress(), 100);
    assert!(!c.is_preloading());
    assert_eq!(c.scheduler().outstanding(), 0);
    assert_eq!(c.loader().issued(), 0);
    assert_eq!(c.list_mut().total_height(), 20_000);

    let out = c.render(|_, index, info| (index, info.is_none()));
    assert_eq!(out.total_height, 20_000);
    assert_eq!(out.leading_spacer, 0);
    assert_eq!(out.trailing_spacer, 19_000);
    assert_eq!(out.source, Some(SignalSource::Scroll));
    let indices: Vec<usize> = out.items.iter().map(|it| it.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert!(out.items.iter().all(|it| it.output.1 && it.height == 200));
    assert_eq!(out.items[3].top, 600);
}

#[test]
fn asset_height_lands_after_load() {
    let mut c = controller(
        vec![Some(String::from("hero.png"))],
        ListOptions::new(0, 50u32),
    );
    assert!(c.is_preloading());
    assert_eq!(c.preload_progress(), 0);
    assert_eq!(c.list_mut().total_height(), 50);

    c.tick(1);
    let requests = c.loader_mut().take_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "hero.png");
    assert_eq!(requests[0].ticket.index, 0);

    // 768x300 natural, shown 800 - 32 = 768 wide.
    let outcome = c.complete_load(requests[0].ticket, Ok(AssetDimensions::new(768, 300)), 5);
    assert_eq!(outcome.height(), Some(350));
    assert_eq!(c.preload_progress(), 100);
    assert!(!c.is_preloading());
    assert_eq!(c.scheduler().outstanding(), 0);
    assert_eq!(c.list_mut().total_height(), 350);

    let out = c.render(|item, _, info| (item.clone(), info.map(|a| a.display_width)));
    assert_eq!(out.total_height, 350);
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0].height, 350);
    assert_eq!(out.items[0].output, (Some(String::from("hero.png")), Some(768)));

    let info = c.asset_info(0).unwrap();
    assert_eq!((info.natural_width, info.natural_height), (768, 300));
    assert_eq!(info.display_extent(), 300);
}

#[test]
fn replacing_items_discards_late_completions() {
    let mut c = Controller::new(
        asset_items(10),
        ListOptions::new(0, 50u32),
        url_options().with_batch_size(10),
        LoadQueue::new(),
        TimerIdleScheduler::default(),
        0,
    );
    c.tick(1);
    let stale = c.loader_mut().take_requests();
    assert_eq!(stale.len(), 10);
    assert_eq!(c.resolver().in_flight(), 10);
    let old_generation = c.generation();

    c.on_scroll(400, 1);
    c.set_items(vec![None; 10], 2);
    assert_ne!(c.generation(), old_generation);
    assert_eq!(c.resolver().in_flight(), 0);

    for req in stale {
        let outcome = c.complete_load(req.ticket, Ok(AssetDimensions::new(100, 400)), 3);
        assert!(outcome.is_stale());
    }
    assert_eq!(c.list().resolved_count(), 10);
    assert!((0..10).all(|i| c.list().cache().height(i) == Some(50)));
    assert!((0..10).all(|i| c.asset_info(i).is_none()));
    assert_eq!(c.list_mut().total_height(), 500);
    assert_eq!(c.preload_progress(), 100);
    assert_eq!(c.scheduler().outstanding(), 0);

    // The throttled offset belonged to the old data set.
    assert_eq!(c.tick(1_000), None);
    assert_eq!(c.list().scroll_offset(), 0);
}

#[test]
fn late_completion_does_not_finish_the_replacing_load() {
    let mut c = Controller::new(
        asset_items(10),
        ListOptions::new(0, 50u32),
        url_options().with_batch_size(10),
        LoadQueue::new(),
        TimerIdleScheduler::default(),
        0,
    );
    c.tick(1);
    let stale = c.loader_mut().take_requests();
    assert_eq!(stale.len(), 10);

    let replacement: Vec<Item> = (0..10).map(|i| Some(format!("next-{i}.png"))).collect();
    c.set_items(replacement, 2);
    c.tick(3);
    let fresh = c.loader_mut().take_requests();
    assert_eq!(fresh.len(), 10);
    assert!(fresh.iter().zip(&stale).all(|(f, s)| f.ticket.index == s.ticket.index));
    assert_eq!(c.resolver().in_flight(), 10);

    // Same indexes, older generation: nothing lands.
    for req in stale {
        let outcome = c.complete_load(req.ticket, Ok(AssetDimensions::new(100, 400)), 4);
        assert!(outcome.is_stale());
    }
    assert_eq!(c.resolver().in_flight(), 10);
    assert_eq!(c.list().resolved_count(), 0);
    assert!(c.is_preloading());

    for req in fresh {
        let outcome = c.complete_load(req.ticket, Ok(AssetDimensions::new(768, 300)), 5);
        assert_eq!(outcome.height(), Some(350));
    }
    assert_eq!(c.list_mut().total_height(), 3_500);
    assert_eq!(c.preload_progress(), 100);
    assert_eq!(c.asset_info(0).map(|a| a.url.as_str()), Some("next-0.png"));
}

#[test]
fn idle_slices_dispatch_in_batches_until_done() {
    let mut c = controller(asset_items(7), ListOptions::new(0, 50u32));

    c.tick(1);
    assert_eq!(c.loader().issued(), 3);
    // The follow-up slice is not due yet.
    c.tick(1);
    assert_eq!(c.loader().issued(), 3);
    c.tick(2);
    assert_eq!(c.loader().issued(), 6);
    c.tick(3);
    assert_eq!(c.loader().issued(), 7);

    let requests = c.loader_mut().take_requests();
    let order: Vec<usize> = requests.iter().map(|r| r.ticket.index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6]);

    // Loads in flight keep the preloader scheduled.
    c.tick(4);
    assert_eq!(c.scheduler().outstanding(), 1);
    assert!(c.is_preloading());

    for req in &requests[..3] {
        c.complete_load(req.ticket, Ok(AssetDimensions::new(10, 10)), 5);
    }
    assert_eq!(c.preload_progress(), 43);

    for req in &requests[3..] {
        c.complete_load(req.ticket, Ok(AssetDimensions::new(10, 10)), 6);
    }
    assert_eq!(c.preload_progress(), 100);
    assert!(c.preloader().is_complete());
    assert_eq!(c.scheduler().outstanding(), 0);

    c.tick(100);
    assert_eq!(c.scheduler().outstanding(), 0);
    assert_eq!(c.loader().issued(), 7);
}

#[test]
fn progress_rounds_to_nearest_percent() {
    let mut p = Preloader::new(3);
    assert_eq!(p.progress(0), 100);

    p.start(3, Vec::new());
    assert_eq!(p.progress(0), 0);
    assert_eq!(p.progress(1), 33);
    assert_eq!(p.progress(2), 67);
    assert_eq!(p.progress(3), 100);
    assert_eq!(p.progress(9), 100);

    p.start(8, Vec::new());
    assert_eq!(p.progress(1), 13);
}

#[test]
fn timer_scheduler_estimates_budget_and_forces_timeout() {
    let mut s = TimerIdleScheduler::new(1, 50);

    let h = s.request(0, 2000);
    assert_eq!(s.poll(0), None);
    let (got, deadline) = s.poll(10).unwrap();
    assert_eq!(got, h);
    assert_eq!(deadline.time_remaining_ms, 41);
    assert!(!deadline.did_timeout);
    assert!(deadline.has_budget());
    assert_eq!(s.outstanding(), 0);

    // Polled too late to have any budget: the request stays queued.
    let h = s.request(0, 2000);
    assert_eq!(s.poll(500), None);
    assert_eq!(s.outstanding(), 1);

    // The timeout still counts from the original request.
    let (got, forced) = s.poll(2500).unwrap();
    assert_eq!(got, h);
    assert_eq!(forced.time_remaining_ms, 0);
    assert!(forced.did_timeout);
    assert!(forced.has_budget());
    assert_eq!(s.outstanding(), 0);

    let h = s.request(0, 2000);
    s.cancel(h);
    assert_eq!(s.poll(10), None);
    assert_eq!(s.outstanding(), 0);
}

#[test]
fn slice_without_budget_is_retried() {
    let mut c = controller(asset_items(1), ListOptions::new(0, 50u32));

    // Polled long after the slice was due: no budget left, and no timeout yet.
    c.tick(100);
    assert_eq!(c.loader().issued(), 0);
    assert_eq!(c.scheduler().outstanding(), 1);

    c.tick(101);
    assert_eq!(c.loader().issued(), 1);
}

#[test]
fn slow_ticks_still_drain_after_idle_timeout() {
    let mut c = controller(asset_items(3), ListOptions::new(0, 50u32));

    // Every poll lands ~100ms past the due time, so no slice ever has budget of its own.
    let mut now_ms = 0;
    while now_ms < 1_900 {
        now_ms += 100;
        c.tick(now_ms);
        assert_eq!(c.loader().issued(), 0, "dispatched early at t={now_ms}");
    }

    c.tick(2_000);
    assert_eq!(c.loader().issued(), 3);

    for req in c.loader_mut().take_requests() {
        c.complete_load(req.ticket, Ok(AssetDimensions::new(768, 300)), 2_050);
    }
    assert_eq!(c.preload_progress(), 100);
    assert!(!c.is_preloading());
    assert_eq!(c.scheduler().outstanding(), 0);
}

#[test]
fn native_scheduler_waits_for_host_delivery() {
    let mut c = Controller::new(
        asset_items(3),
        ListOptions::new(0, 50u32),
        url_options().with_idle_timeout_ms(500),
        LoadQueue::new(),
        AnyIdleScheduler::detect(Some(FakeIdleHost::default())),
        0,
    );
    assert!(c.scheduler().is_native());
    assert_eq!(fake_host(c.scheduler()).requested, vec![(1, 500)]);

    c.tick(1_000);
    assert_eq!(c.loader().issued(), 0);

    assert!(!c.scheduler_mut().deliver(IdleHandle(99), 10, false));
    assert!(c.scheduler_mut().deliver(IdleHandle(1), 10, false));
    c.tick(1_000);
    assert_eq!(c.loader().issued(), 3);
    assert_eq!(fake_host(c.scheduler()).requested.len(), 2);

    for req in c.loader_mut().take_requests() {
        c.complete_load(req.ticket, Ok(AssetDimensions::new(4, 3)), 1_001);
    }
    assert!(!c.is_preloading());
    assert_eq!(fake_host(c.scheduler()).cancelled, vec![2]);
    assert_eq!(c.scheduler().outstanding(), 0);

    let polyfill = AnyIdleScheduler::<FakeIdleHost>::detect(None);
    assert!(!polyfill.is_native());
}

#[test]
fn scroll_is_debounced_while_intersections_are_reported() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut c = Controller::new(
        vec![None; 100],
        ListOptions::new(0, 200u32),
        url_options().with_on_scroll(Some(move |offset: u64| sink.lock().unwrap().push(offset))),
        LoadQueue::new(),
        TimerIdleScheduler::default(),
        0,
    );
    c.set_observer_available(true);

    c.on_scroll(500, 0);
    c.on_scroll(900, 40);
    assert!(!c.wants_frame());
    assert_eq!(c.on_frame(), None);
    assert_eq!(c.tick(100), None);
    assert_eq!(c.list().scroll_offset(), 0);

    assert_eq!(c.tick(140), Some(900));
    assert_eq!(c.list().scroll_offset(), 900);
    assert_eq!(c.tick(300), None);
    assert_eq!(*seen.lock().unwrap(), vec![500, 900]);
}

#[test]
fn scroll_coalesces_to_frames_without_observer() {
    let mut c = controller(vec![None; 100], ListOptions::new(0, 200u32));

    c.on_scroll(300, 0);
    c.on_scroll(600, 5);
    assert!(c.wants_frame());
    assert_eq!(c.on_frame(), Some(600));
    assert_eq!(c.on_frame(), None);
    assert_eq!(c.list().scroll_offset(), 600);

    // No frame arrives: the fallback timer flushes it.
    c.on_scroll(800, 10);
    assert_eq!(c.tick(20), None);
    assert_eq!(c.tick(26), Some(800));
    assert_eq!(c.list().scroll_offset(), 800);
}

#[test]
fn failed_loads_fall_back_to_default_height() {
    let mut c = controller(
        asset_items(2),
        ListOptions::new(0, 0u32).with_height_fn(|i| 40 + i as u32),
    );
    c.tick(1);
    let requests = c.loader_mut().take_requests();
    assert_eq!(requests.len(), 2);

    let outcome = c.complete_load(
        requests[0].ticket,
        Err(AssetError::Network(String::from("timeout"))),
        2,
    );
    assert_eq!(
        outcome,
        LoadOutcome::Fallback {
            index: 0,
            height: 40,
            error: AssetError::Network(String::from("timeout")),
        }
    );

    let outcome = c.complete_load(requests[1].ticket, Ok(AssetDimensions::new(0, 100)), 2);
    assert_eq!(
        outcome,
        LoadOutcome::Fallback {
            index: 1,
            height: 41,
            error: AssetError::InvalidDimensions {
                width: 0,
                height: 100
            },
        }
    );

    assert_eq!(c.preload_progress(), 100);
    assert_eq!(c.list_mut().total_height(), 81);
    assert!(c.asset_info(0).is_none());
    assert!(c.asset_info(1).is_none());
}

#[test]
fn width_change_remeasures_from_natural_dimensions() {
    let mut c = controller(
        vec![Some(String::from("a.png")), None],
        ListOptions::new(0, 50u32),
    );
    c.tick(1);
    let req = c.loader_mut().take_requests().remove(0);
    c.complete_load(req.ticket, Ok(AssetDimensions::new(768, 300)), 2);
    assert_eq!(c.list_mut().total_height(), 400);

    assert_eq!(c.set_container_width(800), 0);
    // 544 - 32 = 512 wide; 512 * 300 / 768 = 200.
    assert_eq!(c.set_container_width(544), 1);
    assert_eq!(c.loader().issued(), 1);
    assert_eq!(c.list().cache().height(0), Some(250));
    assert_eq!(c.list().cache().height(1), Some(50));
    assert_eq!(c.list_mut().total_height(), 300);
    assert_eq!(c.asset_info(0).map(|a| a.display_width), Some(512));
}

#[test]
fn intersection_signal_takes_precedence_over_scroll() {
    let mut c = controller(
        vec![None; 100],
        ListOptions::new(0, 200u32)
            .with_container_height(400)
            .with_overscan(2),
    );
    c.set_observer_available(true);
    let entries = [50, 51, 52].map(IntersectionEntry::enter);
    assert!(c.on_intersection(entries));
    assert!(!c.on_intersection(entries));

    let out = c.render(|_, index, _| index);
    assert_eq!(out.source, Some(SignalSource::Intersection));
    let indices: Vec<usize> = out.items.iter().map(|it| it.output).collect();
    assert_eq!(indices, (48..=54).collect::<Vec<_>>());
    assert_eq!(out.leading_spacer, 48 * 200);
    assert_eq!(out.trailing_spacer, (100 - 55) * 200);

    c.set_observer_available(false);
    let out = c.render(|_, index, _| index);
    assert_eq!(out.source, Some(SignalSource::Scroll));
    assert_eq!(out.items.first().map(|it| it.index), Some(0));
}

#[test]
fn empty_data_set_renders_nothing() {
    let mut c = controller(Vec::new(), ListOptions::new(0, 50u32));
    assert_eq!(c.preload_progress(), 100);
    assert!(!c.is_preloading());

    let out = c.render(|_, index, _| index);
    assert_eq!(out.total_height, 0);
    assert_eq!(out.source, None);
    assert!(out.items.is_empty());
}
