use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "booking-gateway")]
#[command(about = "Rate-limited public API gateway for the booking platform")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Per-identity limit: max requests per minute
    #[arg(long, default_value_t = 60)]
    pub per_minute: u32,

    // Per-identity limit: max requests per hour
    #[arg(long, default_value_t = 1000)]
    pub per_hour: u32,
}
