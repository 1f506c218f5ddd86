fn main() -> std::process::ExitCode {
    opd_desk_lib::run()
}
