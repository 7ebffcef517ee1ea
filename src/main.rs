fn main() -> std::process::ExitCode {
    medrec_lib::run()
}
