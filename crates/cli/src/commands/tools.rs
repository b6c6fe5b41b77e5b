//! `textloop tools` — List the built-in tools.

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let tools = super::build_tools(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools.definitions())?);
        return Ok(());
    }

    println!();
    println!("  Available tools ({}):", tools.len());
    println!();
    for def in tools.definitions() {
        println!("  {:<12} {}", def.name, def.description);
    }
    println!();
    Ok(())
}
