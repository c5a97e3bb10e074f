//! Fetching offered files from Telegram's file endpoint.

use std::path::Path;

use {
    async_trait::async_trait,
    printrelay_print::FileSource,
    teloxide::{prelude::*, types::File as TelegramFile},
    tokio::io::AsyncWriteExt,
    tracing::debug,
};

use crate::error::{Error, Result};

pub struct TelegramFileSource {
    bot: Bot,
    client: reqwest::Client,
}

impl TelegramFileSource {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            client: reqwest::Client::new(),
        }
    }

    /// `<api>/file/bot<token>/<file_path>`. Contains the token; never log it.
    fn file_url(&self, file: &TelegramFile) -> Result<reqwest::Url> {
        self.bot
            .api_url()
            .join(&format!("file/bot{}/{}", self.bot.token(), file.path))
            .map_err(|e| Error::external("invalid file url", e))
    }

    /// Stream the file behind `file_id` into `dest`, returning the byte count.
    pub async fn download(&self, file_id: &str, dest: &Path) -> Result<u64> {
        let file = self.bot.get_file(file_id).await?;
        let url = self.file_url(&file)?;

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Download {
                status: response.status(),
            });
        }

        let mut out = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::external(format!("failed to create {}", dest.display()), e))?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk)
                .await
                .map_err(|e| Error::external(format!("failed to write {}", dest.display()), e))?;
            written += chunk.len() as u64;
        }
        out.flush()
            .await
            .map_err(|e| Error::external(format!("failed to write {}", dest.display()), e))?;

        debug!(
            file_path = %file.path,
            dest = %dest.display(),
            bytes = written,
            "downloaded telegram file"
        );
        Ok(written)
    }
}

#[async_trait]
impl FileSource for TelegramFileSource {
    async fn fetch(&self, file_id: &str, dest: &Path) -> anyhow::Result<()> {
        self.download(file_id, dest).await?;
        Ok(())
    }
}
