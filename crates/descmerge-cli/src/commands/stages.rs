//! Single-stage commands, each rewriting only its own document.

use super::Context;

pub fn registry(ctx: &Context) -> anyhow::Result<()> {
    let dirty = ctx.pipeline().refresh_registry()?;
    report("registry", dirty);
    Ok(())
}

pub fn combine(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let dirty = ctx.pipeline().combine(force)?;
    report("combined", dirty);
    Ok(())
}

pub fn index(ctx: &Context) -> anyhow::Result<()> {
    let dirty = ctx.pipeline().project_index()?;
    report("index", dirty);
    Ok(())
}

fn report(document: &str, dirty: bool) {
    if dirty {
        println!("✓ Rewrote {document} document");
    } else {
        println!("✓ {document} document already up to date");
    }
}
