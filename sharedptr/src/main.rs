use io_impl::RealIo;
use log::error;
use sharedptr_lib::app::run;

fn main() {
    env_logger::init();
    if let Err(e) = run(&RealIo()) {
        error!("{}", e);
        eprintln!("err {}", e);
        std::process::exit(1);
    }
}
