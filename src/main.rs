use anyhow::Result;
use log::error;

fn main() -> Result<()> {
    env_logger::init();

    // Asset pair resolved relative to the working directory, overridable
    // from the command line: cairn [model.mtl] [model.obj]
    let mut args = std::env::args().skip(1);
    let material_path = args.next().unwrap_or_else(|| "model.mtl".to_string());
    let geometry_path = args.next().unwrap_or_else(|| "model.obj".to_string());

    let mut app = cairn::default();

    // Import failure is contained: the viewer keeps running and renders an
    // empty scene.
    if let Err(err) = app.import_model(&material_path, &geometry_path) {
        error!("model import failed: {:#}", anyhow::Error::new(err));
    }

    app.run();
    Ok(())
}
