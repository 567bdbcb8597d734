use podcast_datastore::DataStore;

use crate::{
    extract::ExtractionChain, xyz::PageFetcher, EpisodeProcessor, Summarizer, Transcriber,
};

pub struct EpisodeProcessorBuilder<D = (), F = (), S = (), T = ()> {
    store: D,
    page_fetcher: F,
    summarizer: S,
    transcriber: T,
}

impl EpisodeProcessorBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            page_fetcher: (),
            summarizer: (),
            transcriber: (),
        }
    }
}

impl Default for EpisodeProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, F, S, T> EpisodeProcessorBuilder<D, F, S, T> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> EpisodeProcessorBuilder<D2, F, S, T> {
        EpisodeProcessorBuilder {
            store,
            page_fetcher: self.page_fetcher,
            summarizer: self.summarizer,
            transcriber: self.transcriber,
        }
    }

    pub fn page_fetcher<F2: PageFetcher + Send + Sync + 'static>(
        self,
        page_fetcher: F2,
    ) -> EpisodeProcessorBuilder<D, F2, S, T> {
        EpisodeProcessorBuilder {
            store: self.store,
            page_fetcher,
            summarizer: self.summarizer,
            transcriber: self.transcriber,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> EpisodeProcessorBuilder<D, F, S2, T> {
        EpisodeProcessorBuilder {
            store: self.store,
            page_fetcher: self.page_fetcher,
            summarizer,
            transcriber: self.transcriber,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> EpisodeProcessorBuilder<D, F, S, T2> {
        EpisodeProcessorBuilder {
            store: self.store,
            page_fetcher: self.page_fetcher,
            summarizer: self.summarizer,
            transcriber,
        }
    }
}

impl<D, F, S, T> EpisodeProcessorBuilder<D, F, S, T>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
{
    pub fn build(self) -> EpisodeProcessor<D, F, S, T> {
        EpisodeProcessor {
            store: self.store,
            page_fetcher: self.page_fetcher,
            summarizer: self.summarizer,
            transcriber: self.transcriber,
            extraction: ExtractionChain::default(),
        }
    }
}
