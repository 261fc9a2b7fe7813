fn main() -> anyhow::Result<()> {
    blitzkit::cli::run_cli()
}
