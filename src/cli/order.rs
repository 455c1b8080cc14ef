//! Order command implementation

use crate::config::Config;
use crate::execution::{Order, OrderGateway, OrderSubmitter, SubmitterConfig};
use crate::orderbook::Side;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Order side: buy or sell
    #[arg(long)]
    pub side: Side,

    /// Limit price
    #[arg(long)]
    pub price: Decimal,

    /// Order quantity
    #[arg(long)]
    pub amount: Decimal,

    /// Market symbol (defaults to the configured one)
    #[arg(short, long)]
    pub market: Option<String>,
}

impl OrderArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let market = self
            .market
            .clone()
            .unwrap_or_else(|| config.market.symbol.clone());

        let submitter_config =
            SubmitterConfig::from_credentials(&config.exchange.order_url, &config.credentials)?
                .recv_window(config.sync.recv_window_ms);
        let gateway = OrderSubmitter::new(submitter_config)?;

        let order = Order::new(market, self.side, self.price, self.amount);
        let response = gateway.create_order(&order).await?;

        // Rejections are already logged; the raw response is the result
        println!("status: {}", response.status);
        println!("{}", response.body);

        Ok(())
    }
}
