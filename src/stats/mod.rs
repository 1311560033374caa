//! Stats module - dashboard aggregations

mod aggregate;

pub use aggregate::{
    average_rating, mean_sales_by_location, rating_histogram, sales_by_date_region,
    sales_by_product_line, total_sales, Dashboard, DailyRegionSales, HistogramBin, LocationSales,
    ProductLineSales, RATING_BINS,
};
