use std::process::ExitCode;

fn main() -> ExitCode {
    chunked_svo::gpu::run()
}
