//! CLI commands implementation

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use servelink_client::Client;
use servelink_core::{ClientConfig, InferenceRequest, Tensor, TensorValue};

/// Build the client, preferring a config file when one is given
pub async fn build_client(
    host: &str,
    port: u16,
    tries: u32,
    config: Option<&Path>,
) -> Result<Client> {
    let client = match config {
        Some(path) => {
            let config = ClientConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            Client::from_config(config).await?
        }
        None => Client::builder(host, port).n_tries(tries).build().await?,
    };
    Ok(client)
}

/// Issue a prediction and print the outputs as JSON
pub async fn predict(
    client: &Client,
    inputs: &str,
    model: String,
    signature: Option<String>,
    output: Vec<String>,
) -> Result<()> {
    let inputs = parse_inputs(inputs)?;

    let mut request = InferenceRequest::new(inputs).with_model(model);
    if let Some(signature) = signature {
        request = request.with_signature(signature);
    }
    if !output.is_empty() {
        request = request.with_output_names(output);
    }

    let outputs = client.predict(request).await?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

/// List the models loaded by the backend
pub async fn models(client: &Client) -> Result<()> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models loaded");
        return Ok(());
    }

    println!("{:<30} {:>10}", "NAME", "VERSION");
    for model in models {
        println!("{:<30} {:>10}", model.name, model.version);
    }
    Ok(())
}

/// Parse the JSON input map into named tensors.
///
/// Numbers become f32 scalars, arrays of numbers become rank-1 f32
/// tensors, strings and arrays of strings map to string tensors.
fn parse_inputs(raw: &str) -> Result<HashMap<String, Tensor>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("inputs must be a JSON object")?;
    let object = match value {
        serde_json::Value::Object(object) => object,
        _ => bail!("inputs must be a JSON object of name -> value"),
    };

    let mut inputs = HashMap::new();
    for (name, value) in object {
        let tensor = json_to_tensor(&name, value)?;
        inputs.insert(name, tensor);
    }
    Ok(inputs)
}

fn json_to_tensor(name: &str, value: serde_json::Value) -> Result<Tensor> {
    use serde_json::Value;

    match value {
        Value::Number(n) => {
            let v = n
                .as_f64()
                .with_context(|| format!("input {:?} is not a finite number", name))?;
            Ok(Tensor::scalar_f32(v as f32))
        }
        Value::String(s) => Ok(Tensor::new(Vec::new(), TensorValue::String(vec![s]))),
        Value::Array(items) => {
            if items.iter().all(|i| i.is_number()) {
                let values = items
                    .iter()
                    .map(|i| i.as_f64().map(|v| v as f32))
                    .collect::<Option<Vec<f32>>>()
                    .with_context(|| format!("input {:?} has a non-finite element", name))?;
                Ok(Tensor::vector_f32(values))
            } else if items.iter().all(|i| i.is_string()) {
                let values: Vec<String> = items
                    .into_iter()
                    .map(|i| match i {
                        Value::String(s) => s,
                        _ => unreachable!(),
                    })
                    .collect();
                let len = values.len() as i64;
                Ok(Tensor::new(vec![len], TensorValue::String(values)))
            } else {
                bail!(
                    "input {:?} must be an array of numbers or an array of strings",
                    name
                )
            }
        }
        other => bail!("input {:?} has unsupported JSON type: {}", name, other),
    }
}
