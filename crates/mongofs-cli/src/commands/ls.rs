use mongofs_core::{EntryKind, Presenter};

pub async fn run(
    presenter: &Presenter,
    path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| "/".to_string());
    let locator = presenter.grammar().resolve(&path)?;
    let children = presenter.list_children(&locator).await?;

    for child in children {
        match child.kind {
            EntryKind::Directory => println!("{}/", child.name),
            EntryKind::File => println!("{}", child.name),
        }
    }

    Ok(())
}
