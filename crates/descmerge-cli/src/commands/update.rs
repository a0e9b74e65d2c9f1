use descmerge_sync::UpdateOptions;

use super::Context;

pub fn update(ctx: &Context, push: bool, pull_descriptions: bool) -> anyhow::Result<()> {
    let options = UpdateOptions {
        pull_descriptions,
        push,
    };
    match ctx.pipeline().run(options) {
        Ok(report) => {
            if report.any_dirty() {
                println!("✓ Updated");
                println!("  registry: {}", mark(report.registry_dirty));
                println!("  combined: {}", mark(report.combined_dirty));
                println!("  index:    {}", mark(report.index_dirty));
            } else {
                println!("✓ Already up to date");
            }
            if report.published {
                println!("  Published to origin");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Update failed: {e}");
            Err(e.into())
        }
    }
}

fn mark(dirty: bool) -> &'static str {
    if dirty { "rewritten" } else { "unchanged" }
}
