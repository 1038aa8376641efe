use std::panic;

pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        log::error!("Panic: {panic_info}");
        log::Log::flush(log::logger());

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
