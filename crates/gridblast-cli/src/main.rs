mod command;
mod high_score_file;
mod player;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
