fn main() -> std::process::ExitCode {
    gap_extension_lib::run()
}
