mod autodiff;
mod residual;
mod sequencing;
mod targeting;

pub fn init_logger() {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
}
