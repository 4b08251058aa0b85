use crate::commands::Out;
use crate::prompt::Prompter;
use crate::render::Renderer;
use crate::split::{split, Receipt};
use crate::{Config, Result};
use anyhow::Context;
use std::io::{BufRead, Write};
use tracing::debug;

/// Asks for the bill's inputs, splits it and writes the receipt image.
///
/// Fonts are loaded before the first question so that a bad font file is reported before the user
/// has typed anything.
///
/// # Arguments
/// - `config` - Where the image goes and how it is drawn.
/// - `prompter` - Source of the seven answers, normally stdin/stdout.
///
/// # Errors
/// - The input ends before every question is answered.
/// - The bill cannot be split, e.g. the usages cancel out to zero.
/// - The image cannot be rendered or written.
pub async fn split_bill<R, W>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<Out<Receipt>>
where
    R: BufRead,
    W: Write,
{
    let renderer = Renderer::new(config.render().clone())?;
    let bill = prompter.collect()?;
    debug!(
        "Splitting {} between {} and {}",
        bill.total_money(),
        bill.first_person().name(),
        bill.second_person().name()
    );

    let receipt = split(&bill).context("Unable to split the bill")?;
    let path = renderer
        .render(receipt.lines(), &bill.file_stem(), config.output_dir())
        .await
        .context("Unable to generate the receipt image")?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Out::new(
        format!("Image generated successfully! Saved as: {file_name}"),
        receipt,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Figure, Side};
    use crate::split::Settlement;
    use crate::test::{prompter, TestEnv, ONE_SIDED};
    use std::str::FromStr;

    #[tokio::test]
    async fn test_split_bill_writes_receipt() {
        let env = TestEnv::new().await;
        let mut p = prompter(ONE_SIDED);
        let out = split_bill(&env.config(), &mut p).await.unwrap();

        let written = env.written();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("A_B_"), "{name}");
        assert!(name.ends_with(".jpg"), "{name}");
        assert_eq!(
            out.message(),
            format!("Image generated successfully! Saved as: {name}")
        );

        let receipt = out.structure().unwrap();
        assert_eq!(
            receipt.lines().last().unwrap(),
            "A should pay: 25*10 = 250 taka"
        );
        assert_eq!(
            receipt.settlement(),
            Settlement::Payment {
                payer: Side::First,
                excess: Figure::from_str("25").unwrap(),
                per_unit_cost: Figure::from_str("10").unwrap(),
                amount: Figure::from_str("250").unwrap(),
            }
        );

        let image = image::open(&written[0]).unwrap();
        assert_eq!(image.width(), 320);
        assert_eq!(image.height(), 9 * 16 + 2 * 8);
    }

    #[tokio::test]
    async fn test_split_bill_equal_usage_image_height() {
        let env = TestEnv::new().await;
        let mut p = prompter("Rahim\n0\n30\nKarim Uddin\n70\n100\n1200\n");
        let out = split_bill(&env.config(), &mut p).await.unwrap();
        assert_eq!(out.structure().unwrap().lines().len(), 3);

        let written = env.written();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Rahim_Karim%20Uddin_"), "{name}");
        let image = image::open(&written[0]).unwrap();
        assert_eq!(image.height(), 3 * 16 + 2 * 8);
    }

    #[tokio::test]
    async fn test_split_bill_reprompts_then_succeeds() {
        let env = TestEnv::new().await;
        let mut p = prompter("\nA\nten\n100\n150\nB\n100\n100\nlots\n500\n");
        let out = split_bill(&env.config(), &mut p).await.unwrap();
        assert!(out.structure().is_some());
        assert_eq!(env.written().len(), 1);
    }

    #[tokio::test]
    async fn test_split_bill_input_ends_without_output() {
        let env = TestEnv::new().await;
        let mut p = prompter("A\n100\n150\nB\n");
        assert!(split_bill(&env.config(), &mut p).await.is_err());
        assert!(env.written().is_empty());
    }

    #[tokio::test]
    async fn test_split_bill_zero_total_usage() {
        let env = TestEnv::new().await;
        let mut p = prompter("A\n0\n10\nB\n10\n0\n100\n");
        let err = split_bill(&env.config(), &mut p).await.unwrap_err();
        assert!(format!("{err:#}").contains("Total usage is zero"));
        assert!(env.written().is_empty());
    }
}
