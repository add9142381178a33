//! Built-in signature tables.

/// Hostname fragments and the CDN they belong to. Order is significant: it is
/// the order in which matches are reported.
pub(super) const SIGNATURES: &[(&str, &str)] = &[
    (".amazonaws.com", "Amazon AWS"),
    ("cdn.geeksforgeeks.org", "GeeksForGeeksCDN"),
    (".discordapp.com", "Discord"),
    (".airee.international", "Airee"),
    (".myracloud.com", "Myra"),
    (".msecnd.ne", "MicrosoftAzure"),
    (".clever-cloud.com", "Clever-cloud"),
    (".awsdn", "AWSdns"),
    (".turbobytes-cdn.com", "Turbo Bytes"),
    (".akadns.net", "Akamai"),
    (".anankecdn.com.br", "Ananke"),
    (".belugacdn.com", "BelugaCDN"),
    (".cdnify.io", "CDNify"),
    (".clients.turbobytes.net", "Turbo Bytes"),
    (".lambdacdn.net", "LambdaCDN"),
    (".akamai.net", "Akamai"),
    (".akamaized.net", "Akamai"),
    (".akamaiedge.net", "Akamai"),
    (".akamaihd.net", "Akamai"),
    (".edgesuite.net", "Akamai"),
    (".edgekey.net", "Akamai"),
    (".srip.net", "Akamai"),
    (".akamaitechnologies.com", "Akamai"),
    (".akamaitechnologies.fr", "Akamai"),
    (".tl88.net", "AkamaiChinaCDN"),
    (".llnwd.net", "Limelight"),
    (".lldns.net", "Limelight"),
    (".netdna-cdn.com", "StackPath"),
    (".netdna-ssl.com", "StackPath"),
    (".netdna.com", "StackPath"),
    (".gfx.ms", "Limelight"),
    (".adn.", "EdgeCast"),
    (".wac.", "EdgeCast"),
    (".wpc.", "EdgeCast"),
    (".fastly.net", "Fastly"),
    (".fastlylb.net", "Fastly"),
    ("edgecastcdn.net", "EdgeCast"),
    (".systemcdn.net", "EdgeCast"),
    (".transactcdn.net", "EdgeCast"),
    (".v1cdn.net", "EdgeCast"),
    (".v2cdn.net", "EdgeCast"),
    (".v3cdn.net", "EdgeCast"),
    (".v4cdn.net", "EdgeCast"),
    (".v5cdn.net", "EdgeCast"),
    ("hwcdn.net", "Highwinds"),
    (".simplecdn.net", "SimpleCDN"),
    (".instacontent.net", "MirrorImage"),
    (".cap-mii.net", "MirrorImage"),
    (".footprint.net", "Level3"),
    (".fpbns.net", "Level3"),
    (".ay1.b.yahoo.com", "Yahoo"),
    (".yimg.", "Yahoo"),
    (".yahooapis.com", "Yahoo"),
    (".google.", "Google"),
    ("googlesyndication.", "Google"),
    ("youtube.", "Google"),
    (".googleusercontent.com", "Google"),
    ("googlehosted.com", "Google"),
    (".gstatic.com", "Google"),
    (".doubleclick.net", "Google"),
    (".insnw.net", "InstartLogic"),
    (".inscname.net", "InstartLogic"),
    (".internapcdn.net", "Internap"),
    (".cloudfront.net", "Cloudfront"),
    (".kxcdn.com", "KeyCDN"),
    (".cotcdn.net", "CotendoCDN"),
    (".cachefly.net", "Cachefly"),
    ("bo.lt", "BO.LT"),
    (".cloudflare.net", "Cloudflare"),
    (".cloudflare.com", "Cloudflare"),
    (".afxcdn.net", "afxcdn.net"),
    (".wscdns.com", "ChinaNetCenter"),
    (".wscloudcdn.com", "ChinaNetCenter"),
    (".ourwebpic.com", "ChinaNetCenter"),
    (".att-dsa.net", "AT&T"),
    (".vo.msecnd.net", "MicrosoftAzure"),
    (".azureedge.net", "MicrosoftAzure"),
    (".voxcdn.net", "VoxCDN"),
    (".bluehatnetwork.com", "BlueHatNetwork"),
    (".swiftcdn1.com", "SwiftCDN"),
    (".swiftserve.com", "SwiftServe"),
    (".cdngc.net", "CDNetworks"),
    (".gccdn.net", "CDNetworks"),
    (".gccdn.cn", "CDNetworks"),
    (".panthercdn.com", "CDNetworks"),
    (".nocookie.net", "Fastly"),
    (".cdn.bitgravity.com", "Tata communications"),
    (".cdn.telefonica.com", "Telefonica"),
    (".gslb.taobao.com", "Taobao"),
    (".gslb.tbcache.com", "Alimama"),
    (".mirror-image.net", "MirrorImage"),
    (".yottaa.net", "Yottaa"),
    (".cubecdn.net", "cubeCDN"),
    (".cdn77.net", "CDN77"),
    (".cdn77.org", "CDN77"),
    (".incapdns.net", "Incapsula"),
    (".bitgravity.com", "BitGravity"),
    (".r.worldcdn.net", "OnApp"),
    (".r.worldssl.net", "OnApp"),
    ("tbcdn.cn", "Taobao"),
    (".taobaocdn.com", "Taobao"),
    (".ngenix.net", "NGENIX"),
    (".pagerain.net", "PageRain"),
    (".ccgslb.com", "ChinaCache"),
    (".ccgslb.net", "ChinaCache"),
    (".c3cache.net", "ChinaCache"),
    (".chinacache.net", "ChinaCache"),
    (".c3cdn.net", "ChinaCache"),
    (".lxdns.com", "ChinaNetCenter"),
    (".speedcdns.com", "QUANTIL/ChinaNetCenter"),
    (".mwcloudcdn.com", "QUANTIL/ChinaNetCenter"),
    ("cdn.sfr.net", "SFR"),
    (".azioncdn.net", "Azion"),
    (".azioncdn.com", "Azion"),
    (".azion.net", "Azion"),
    (".cdncloud.net.au", "MediaCloud"),
    (".rncdn1.com", "ReflectedNetworks"),
    (".cdnsun.net", "CDNsun"),
    (".mncdn.com", "Medianova"),
    (".mncdn.net", "Medianova"),
    (".mncdn.org", "Medianova"),
    ("cdn.jsdelivr.net", "jsDelivr"),
    (".nyiftw.net", "NYIFTW"),
    (".nyiftw.com", "NYIFTW"),
    (".resrc.it", "ReSRC.it"),
    (".zenedge.net", "Zenedge"),
    (".lswcdn.net", "LeaseWebCDN"),
    (".lswcdn.eu", "LeaseWebCDN"),
    (".revcn.net", "RevSoftware"),
    (".revdn.net", "RevSoftware"),
    (".caspowa.com", "Caspowa"),
    (".twimg.com", "Twitter"),
    (".facebook.com", "Facebook"),
    (".facebook.net", "Facebook"),
    (".fbcdn.net", "Facebook"),
    (".cdninstagram.com", "Facebook"),
    (".rlcdn.com", "Reapleaf"),
    (".wp.com", "WordPress"),
    (".aads1.net", "Aryaka"),
    (".aads-cn.net", "Aryaka"),
    (".aads-cng.net", "Aryaka"),
    (".squixa.net", "section.io"),
    (".bisongrid.net", "BisonGrid"),
    (".cdn.gocache.net", "GoCache"),
    (".hiberniacdn.com", "HiberniaCDN"),
    (".cdntel.net", "Telenor"),
    (".raxcdn.com", "Rackspace"),
    (".unicorncdn.net", "UnicornCDN"),
    (".optimalcdn.com", "OptimalCDN"),
    (".kinxcdn.com", "KINXCDN"),
    (".kinxcdn.net", "KINXCDN"),
    (".stackpathdns.com", "StackPath"),
    (".hosting4cdn.com", "Hosting4CDN"),
    (".netlify.com", "Netlify"),
    (".b-cdn.net", "BunnyCDN"),
    (".gtimg", "Tencent"),
];

/// The highest-traffic providers: (needle, canonical CDN, display name).
pub(super) const COMMON: &[(&str, &str, &str)] = &[
    ("Cloudflare", "Cloudflare", "Cloudflare - https://www.cloudflare.com"),
    ("Incapsula", "Incapsula", "Incapsula - https://www.incapsula.com/"),
    ("Cloudfront", "Cloudfront", "Cloudfront - https://aws.amazon.com/cloudfront/"),
    ("Akamai", "Akamai", "Akamai - https://akamai.com"),
    ("Airee", "Airee", "Airee - https://airee.international"),
    ("CacheFly", "Cachefly", "CacheFly - https://www.cachefly.com/"),
    ("EdgeCast", "EdgeCast", "EdgeCast - https://verizondigitalmedia.com"),
    ("MaxCDN", "MaxCDN", "MaxCDN - https://www.maxcdn.com/"),
    ("Beluga", "BelugaCDN", "BelugaCDN - https://belugacdn.com"),
    ("Limelight", "Limelight", "Limelight - https://www.limelight.com"),
    ("Fastly", "Fastly", "Fastly - https://www.fastly.com/"),
    ("Myracloud", "Myra", "Myra - https://myracloud.com"),
    (
        "msecnd.ne",
        "MicrosoftAzure",
        "Microsoft Azure - https://azure.microsoft.com/en-us/services/cdn/",
    ),
    ("Clever-cloud", "Clever-cloud", "Clever Cloud - https://www.clever-cloud.com/"),
];

/// Published edge ranges.
pub(super) const IP_RANGES: &[(&str, &[&str])] = &[
    (
        "Cloudflare",
        &[
            "173.245.48.0/20",
            "103.21.244.0/22",
            "103.22.200.0/22",
            "103.31.4.0/22",
            "141.101.64.0/18",
            "108.162.192.0/18",
            "190.93.240.0/20",
            "188.114.96.0/20",
            "197.234.240.0/22",
            "198.41.128.0/17",
            "162.158.0.0/15",
            "104.16.0.0/13",
            "104.24.0.0/14",
            "172.64.0.0/13",
            "131.0.72.0/22",
            "2400:cb00::/32",
            "2606:4700::/32",
            "2803:f800::/32",
            "2405:b500::/32",
            "2405:8100::/32",
            "2a06:98c0::/29",
            "2c0f:f248::/32",
        ],
    ),
    (
        "Fastly",
        &[
            "23.235.32.0/20",
            "43.249.72.0/22",
            "103.244.50.0/24",
            "103.245.222.0/23",
            "103.245.224.0/24",
            "104.156.80.0/20",
            "140.248.64.0/18",
            "140.248.128.0/17",
            "146.75.0.0/17",
            "151.101.0.0/16",
            "157.52.64.0/18",
            "167.82.0.0/17",
            "167.82.128.0/20",
            "167.82.160.0/20",
            "167.82.224.0/20",
            "172.111.64.0/18",
            "185.31.16.0/22",
            "199.27.72.0/21",
            "199.232.0.0/16",
            "2a04:4e40::/32",
            "2a04:4e42::/32",
        ],
    ),
];
