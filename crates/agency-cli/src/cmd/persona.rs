use super::Context;
use crate::output::print_json;
use agency_core::persona;

pub fn run(ctx: &Context, role: Option<&str>) -> anyhow::Result<()> {
    let Some(role) = role else {
        let current = persona::active(&ctx.root)?;
        if ctx.json {
            return print_json(&serde_json::json!({ "active": current }));
        }
        match current {
            Some(title) => println!("{title}"),
            None => println!("No active persona."),
        }
        return Ok(());
    };

    let registry = ctx.registry()?;
    let id = persona::activate(&registry, &ctx.root, role)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "activated": id }));
    }
    println!("Active persona: {id}");
    Ok(())
}
