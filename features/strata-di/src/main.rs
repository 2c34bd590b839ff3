use std::{error::Error, rc::Rc};

use strata_di::{BeanPromise, Definition, Registry};
use strata_promise::{prelude::*, tick};

fn main() -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();
    registry.provide("address", Definition::factory(|_, _, _| Some("Earth")))?;
    let address = registry.inject("address")?.downcast::<&str>()?;
    println!("address: {address}");

    if let Err(error) =
        Registry::new().provide("address", Definition::factory(|_, _, _| None::<&str>))
    {
        println!("empty address: {} ({error})", error.name());
    }

    let root = Registry::new();
    root.provide_qualified("host", "primary", Definition::factory(|_, _, _| Some("db1")))?;
    let host = Registry::with_parents([root.clone()]).inject("host")?.downcast::<&str>()?;
    println!("host: {host}");

    // A deferred bean settles in the context of the registry owning it
    root.provide(
        "planet",
        Definition::factory(|_, _, _| BeanPromise::resolve(Some("Mars"), None)),
    )?;
    let planet: BeanPromise<Rc<&str>> = root.child().resolve("planet")?;
    let described = planet.then(|planet, context| {
        let owned_by_root = context.is_some_and(|context| context.has_own("host", "primary"));
        Ok::<_, strata_di::InjectError>(format!("{planet} (owned by root: {owned_by_root})"))
    });
    if let Some(settlement) = tick::run_until(described) {
        println!("planet: {}", settlement.into_result()?);
    }

    Ok(())
}
