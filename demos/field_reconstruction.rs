//! Evaluate a hypernetwork-conditioned field and prune it.
//!
//! Run with: cargo run --example field_reconstruction

use flujo::prelude::*;

fn main() -> Result<(), NifError> {
    let cfg_shape = ShapeNetConfig::from_json(
        r#"{
            "input_dim": 2, "output_dim": 1, "units": 16, "nlayers": 2,
            "activation": "sine", "use_resblock": true,
            "connectivity": "full", "omega_0": 30.0
        }"#,
    )?;
    let cfg_param = ParameterNetConfig::from_json(
        r#"{
            "input_dim": 1, "latent_dim": 8, "units": 32, "nlayers": 2,
            "activation": "swish"
        }"#,
    )?;

    let mut model = Nif::with_seed(&cfg_shape, &cfg_param, MixedPolicy::float32(), Some(7))?;
    println!("model: {model:?}");
    println!("po_dim = {}", model.po_dim());

    // A few (t, x, y) rows: time conditions the field, (x, y) samples it.
    let inputs = Tensor::new(
        &[
            0.00, 0.25, 0.50, //
            0.00, 0.75, 0.50, //
            0.50, 0.25, 0.50, //
            0.50, 0.75, 0.50, //
        ],
        &[4, 3],
    );
    let field = model.forward(&inputs)?;
    println!("field before pruning: {:?}", field.data());

    // Knock out half of the hypernetwork, whole shape-net units included.
    for report in model.prune(0.5)? {
        println!(
            "pruned {}/{} entries (sparsity {:.2}, mask v{})",
            report.zeroed, report.total, report.sparsity, report.mask_version
        );
    }

    let field = model.forward(&inputs)?;
    println!("field after pruning:  {:?}", field.data());
    Ok(())
}
