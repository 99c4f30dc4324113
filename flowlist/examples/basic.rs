// Example: fixed default heights, a few resolved heights, and the render window.
use flowlist::{ListOptions, VirtualList};

fn main() {
    let mut l = VirtualList::new(
        ListOptions::new(10_000, 48u32)
            .with_container_height(600)
            .with_overscan(3),
    );

    // Heights discovered later (e.g. after measuring content) shift everything below them.
    l.batch_update(|l| {
        l.record_height(2, 180, None);
        l.record_height(7, 320, None);
    });
    l.set_scroll_offset(1_000);

    let w = l.render_window();
    println!("total_height={}", w.total_height);
    println!("range={:?} source={:?}", w.range, w.source);
    println!(
        "leading_spacer={} trailing_spacer={}",
        w.leading_spacer, w.trailing_spacer
    );

    let mut items = Vec::new();
    l.collect_window_items(&mut items);
    println!("first={:?}", items.first());
    println!("last={:?}", items.last());
}
