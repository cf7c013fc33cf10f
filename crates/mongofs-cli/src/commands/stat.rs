use mongofs_core::{EntryKind, Presenter};

pub async fn run(presenter: &Presenter, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let locator = presenter.grammar().resolve(path)?;
    let attr = presenter.attributes_of(&locator).await?;

    let kind = match attr.kind {
        EntryKind::Directory => "directory",
        EntryKind::File => "regular file",
    };

    println!("  File: {}", path);
    println!("  Size: {}", attr.size);
    println!("  Type: {}", kind);
    println!("Access: {:04o}  Links: {}", attr.perm, attr.nlink);

    Ok(())
}
