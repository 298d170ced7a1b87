use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use shopscout_core::{ProductRecord, SearchFilters, SortKey};
use shopscout_crawler::{
    BrowserPool, HtmlDumpObserver, NoopObserver, PageObserver, Recommender, SiteCrawler,
};
use shopscout_llm::LlmClient;

#[derive(Debug, Parser)]
#[command(name = "shopscout")]
#[command(about = "Multi-site product search from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the configured sites for products
    Search {
        /// Product name or keywords
        query: String,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Minimum rating out of 5
        #[arg(long)]
        min_rating: Option<f64>,
        /// relevance, price_low, price_high, rating, or reviews
        #[arg(long, default_value = "relevance")]
        sort_by: String,
        /// Run the LLM extraction stage (needs a reachable LLM endpoint)
        #[arg(long)]
        with_llm: bool,
    },
    /// Print the active site configuration
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = shopscout_core::load_app_config()?;
    let sites = shopscout_core::load_sites_or_default(&config.sites_path)?;

    match cli.command {
        Commands::Sites => {
            for site in &sites.sites {
                println!("{:<12} {} ({})", site.name, site.search_url, site.id);
            }
            Ok(())
        }
        Commands::Search {
            query,
            min_price,
            max_price,
            min_rating,
            sort_by,
            with_llm,
        } => {
            let sort_by = sort_by
                .parse::<SortKey>()
                .map_err(|e| anyhow::anyhow!(e))?;
            let filters = SearchFilters {
                min_price,
                max_price,
                min_rating,
                sort_by,
            };

            let llm = if with_llm {
                Some(Arc::new(LlmClient::new(
                    &config.llm_api_base,
                    config.llm_api_key.as_deref(),
                    &config.llm_model,
                    config.llm_timeout_secs,
                )?))
            } else {
                None
            };
            let observer: Arc<dyn PageObserver> = match &config.debug_dump_dir {
                Some(dir) => Arc::new(HtmlDumpObserver::new(dir.clone())),
                None => Arc::new(NoopObserver),
            };

            let browser = BrowserPool::new(&config.user_agent);
            let crawler = SiteCrawler::new(
                browser.clone(),
                llm,
                observer,
                config.max_concurrent_sites,
                Duration::from_secs(config.page_timeout_secs),
                config.max_items_per_site,
            );
            let recommender = Recommender::new(sites.sites, crawler);

            println!("Searching for '{query}'...");
            let products = recommender.search(&query, &filters).await?;
            browser.shutdown().await;

            if products.is_empty() {
                println!("No products found. Try adjusting your search criteria.");
            } else {
                println!("\nFound {} products:", products.len());
                for (i, product) in products.iter().enumerate() {
                    print_product(i + 1, product);
                }
            }
            Ok(())
        }
    }
}

fn print_product(index: usize, product: &ProductRecord) {
    println!("\n{index}. {}", product.product_name);
    println!("   Source: {} ({})", product.source, product.extraction_method);
    println!("   Price: {}", product.price);
    println!("   Rating: {}", product.rating.as_deref().unwrap_or("N/A"));
    println!(
        "   Reviews/Sold: {}",
        product.reviews.as_deref().unwrap_or("N/A")
    );
    println!("   Seller: {}", product.seller.as_deref().unwrap_or("N/A"));
    println!("   URL: {}", product.url);
}
