use flowlist::ListOptions;
use flowlist_adapter::{
    AssetDimensions, Controller, ControllerOptions, LoadQueue, TimerIdleScheduler,
};

#[derive(Clone, Debug)]
struct Post {
    title: String,
    image: Option<String>,
}

fn main() {
    // Example: a feed where some posts carry an image whose height is only known once loaded.
    //
    // An adapter would:
    // - call tick(now_ms) from a timer / frame loop
    // - start the loads the controller queued and report them with complete_load
    // - render the spacers and items returned by render()
    let posts: Vec<Post> = (0..200)
        .map(|i| Post {
            title: format!("post #{i}"),
            image: (i % 3 == 0).then(|| format!("https://img.example/{i}.jpg")),
        })
        .collect();

    let mut c = Controller::new(
        posts,
        ListOptions::new(0, 80u32).with_container(800, 600),
        ControllerOptions::new().with_asset_url(|p: &Post, _| p.image.clone()),
        LoadQueue::new(),
        TimerIdleScheduler::default(),
        0,
    );
    println!("progress at start: {}%", c.preload_progress());

    let mut now_ms = 0u64;
    while c.is_preloading() {
        now_ms += 4;
        c.tick(now_ms);
        // Pretend every image decodes instantly at 4:3.
        for req in c.loader_mut().take_requests() {
            c.complete_load(req.ticket, Ok(AssetDimensions::new(1600, 1200)), now_ms);
        }
        if now_ms % 40 == 0 {
            println!("t={now_ms} progress={}%", c.preload_progress());
        }
    }
    println!("done at t={now_ms}");

    c.on_scroll(5_000, now_ms);
    c.on_frame();

    let out = c.render(|post, _, asset| match asset {
        Some(a) => format!("{} [{}x{}]", post.title, a.natural_width, a.natural_height),
        None => post.title.clone(),
    });
    println!(
        "total_height={} leading={} trailing={}",
        out.total_height, out.leading_spacer, out.trailing_spacer
    );
    for it in &out.items {
        println!("  #{:<3} top={:<6} h={:<4} {}", it.index, it.top, it.height, it.output);
    }
}
